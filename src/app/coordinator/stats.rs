//! Run counters, on-disk census and category reports
//!
//! Counters only ever grow by whole jobs: a [`JobOutcome`] is applied after
//! the job downloaded, extracted and removed its archive, never before. The
//! census is independent of the counters and reflects what is actually on
//! disk, including members of a job that was abandoned half way.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::models::JobOutcome;
use crate::app::profile::Category;
use crate::app::rules::OutputRule;
use crate::errors::{TransferError, TransferStage};

/// Extracted member count for one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionCount {
    pub extension: String,
    pub count: u64,
}

/// Aggregate counters of one category run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub archives_downloaded: u64,
    pub archives_removed: u64,
    pub bytes_downloaded: u64,
    /// Extracted members per rule, in declared rule order
    pub extracted: Vec<ExtensionCount>,
    /// Members written to the category root because no rule matched
    pub unrouted: u64,
}

impl RunCounters {
    pub fn for_rules(rules: &[OutputRule]) -> Self {
        Self {
            extracted: rules
                .iter()
                .map(|rule| ExtensionCount {
                    extension: rule.extension.clone(),
                    count: 0,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Add the result of one fully completed job
    pub fn apply(&mut self, outcome: &JobOutcome) {
        self.archives_downloaded += 1;
        self.archives_removed += 1;
        self.bytes_downloaded += outcome.bytes_downloaded;
        for (slot, count) in self.extracted.iter_mut().zip(&outcome.extracted) {
            slot.count += count;
        }
        self.unrouted += outcome.unrouted;
    }

    /// Extracted count for `extension`, summed over rules sharing it
    pub fn extracted_for(&self, extension: &str) -> u64 {
        self.extracted
            .iter()
            .filter(|e| e.extension == extension)
            .map(|e| e.count)
            .sum()
    }

    /// Short one-line rendering used for live progress messages
    pub fn summary_line(&self) -> String {
        let mut parts = vec![format!("{} archives", self.archives_downloaded)];
        parts.extend(
            self.extracted
                .iter()
                .map(|e| format!("{}: {}", e.extension.trim_start_matches('.'), e.count)),
        );
        parts.join(", ")
    }
}

/// Files of one extension currently present in a rule's directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusEntry {
    pub extension: String,
    pub directory: PathBuf,
    pub count: usize,
}

/// Count the files each rule has produced, straight from the filesystem
///
/// Only the immediate contents of each rule directory are counted. A
/// directory that does not exist counts as zero.
pub fn census(category: &Category) -> Vec<CensusEntry> {
    category
        .rules
        .iter()
        .map(|rule| CensusEntry {
            extension: rule.extension.clone(),
            directory: rule.directory.clone(),
            count: count_with_extension(&rule.directory, &rule.extension),
        })
        .collect()
}

fn count_with_extension(directory: &Path, extension: &str) -> usize {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!("Cannot read {} for census: {}", directory.display(), e);
            return 0;
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(extension))
        .count()
}

/// How a category run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every job was processed (failures may have been recorded under `Continue`)
    Completed,
    /// Stopped by a cancellation request
    Cancelled,
    /// Stopped by a failed job under the `Abort` policy
    Failed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => f.write_str("completed"),
            RunOutcome::Cancelled => f.write_str("terminated by user"),
            RunOutcome::Failed => f.write_str("stopped after a failure"),
        }
    }
}

/// One failed job as recorded in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub stage: Option<TransferStage>,
    pub message: String,
}

impl From<&TransferError> for FailureRecord {
    fn from(err: &TransferError) -> Self {
        Self {
            url: err.url.clone(),
            stage: Some(err.stage),
            message: err.source.to_string(),
        }
    }
}

/// Final report of one category, produced on every exit path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    pub outcome: RunOutcome,
    /// Jobs scheduled for this run
    pub scheduled: usize,
    pub counters: RunCounters,
    pub census: Vec<CensusEntry>,
    pub failures: Vec<FailureRecord>,
    pub started_at: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl CategoryReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for CategoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} in {} ({} of {} archives)",
            self.category,
            self.outcome,
            format_duration(self.duration),
            self.counters.archives_downloaded,
            self.scheduled
        )?;
        writeln!(
            f,
            "  Archives downloaded: {}, removed: {}",
            self.counters.archives_downloaded, self.counters.archives_removed
        )?;
        for entry in &self.counters.extracted {
            writeln!(f, "  Extracted {}: {}", entry.extension, entry.count)?;
        }
        if self.counters.unrouted > 0 {
            writeln!(f, "  Extracted without a rule: {}", self.counters.unrouted)?;
        }
        for entry in &self.census {
            writeln!(
                f,
                "  On disk: {} {} files in {}",
                entry.count,
                entry.extension,
                entry.directory.display()
            )?;
        }
        for failure in &self.failures {
            match failure.stage {
                Some(stage) => writeln!(f, "  Failed ({}): {} - {}", stage, failure.url, failure.message)?,
                None => writeln!(f, "  Failed: {} - {}", failure.url, failure.message)?,
            }
        }
        Ok(())
    }
}

/// Reports of every category run in one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub profile: String,
    pub started_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
}

impl SessionReport {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            started_at: Utc::now(),
            categories: Vec::new(),
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.categories
            .iter()
            .any(|r| r.outcome == RunOutcome::Cancelled)
    }

    pub fn has_failures(&self) -> bool {
        self.categories.iter().any(CategoryReport::has_failures)
    }

    /// Process exit code: 1 if any job failed, 0 otherwise (including cancellation)
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }

    /// Serialize the session as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Format a duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if total_secs < 3600 {
        format!("{}m{}s", total_secs / 60, total_secs % 60)
    } else {
        format!("{}h{}m", total_secs / 3600, (total_secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransferFailure;

    fn rules(root: &Path) -> Vec<OutputRule> {
        vec![
            OutputRule::new(".las", root),
            OutputRule::new(".prj", root.join("prj")),
        ]
    }

    fn category(root: &Path) -> Category {
        Category {
            name: "LiDAR".to_string(),
            field_index: 1,
            url_list: root.join("urls.csv"),
            destination: root.to_path_buf(),
            rules: rules(root),
        }
    }

    #[test]
    fn test_counters_apply_whole_outcomes() {
        let mut counters = RunCounters::for_rules(&rules(Path::new("/data")));
        counters.apply(&JobOutcome {
            bytes_downloaded: 10,
            extracted: vec![1, 0],
            unrouted: 0,
        });
        counters.apply(&JobOutcome {
            bytes_downloaded: 20,
            extracted: vec![1, 1],
            unrouted: 2,
        });

        assert_eq!(counters.archives_downloaded, 2);
        assert_eq!(counters.archives_removed, 2);
        assert_eq!(counters.bytes_downloaded, 30);
        assert_eq!(counters.extracted_for(".las"), 2);
        assert_eq!(counters.extracted_for(".prj"), 1);
        assert_eq!(counters.unrouted, 2);
        assert_eq!(counters.summary_line(), "2 archives, las: 2, prj: 1");
    }

    #[test]
    fn test_census_counts_top_level_files_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("A.las"), b"").unwrap();
        std::fs::write(root.join("B.las"), b"").unwrap();
        std::fs::write(root.join("A.zip"), b"").unwrap();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::write(root.join("nested/C.las"), b"").unwrap();

        let census = census(&category(root));

        assert_eq!(census[0].count, 2);
        assert_eq!(census[1].count, 0);
    }

    #[test]
    fn test_report_rendering_and_exit_code() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path());
        let err = TransferError::new(
            "http://x/A.zip",
            temp_dir.path().join("A.zip"),
            TransferStage::Download,
            TransferFailure::Status { status: 404 },
        );

        let report = CategoryReport {
            category: category.name.clone(),
            outcome: RunOutcome::Failed,
            scheduled: 2,
            counters: RunCounters::for_rules(&category.rules),
            census: census(&category),
            failures: vec![FailureRecord::from(&err)],
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
        };

        let rendered = report.to_string();
        assert!(rendered.contains("LiDAR: stopped after a failure in 1.5s (0 of 2 archives)"));
        assert!(rendered.contains("Failed (download): http://x/A.zip"));
        assert!(rendered.contains("On disk: 0 .prj files"));

        let mut session = SessionReport::new("van-2018");
        session.categories.push(report);
        assert_eq!(session.exit_code(), 1);
        assert!(!session.was_cancelled());

        let json = session.to_json().unwrap();
        assert!(json.contains("\"outcome\": \"failed\""));
    }

    #[test]
    fn test_cancelled_session_exits_cleanly() {
        let mut session = SessionReport::new("van-2022");
        session.categories.push(CategoryReport {
            category: "LiDAR".to_string(),
            outcome: RunOutcome::Cancelled,
            scheduled: 5,
            counters: RunCounters::default(),
            census: Vec::new(),
            failures: Vec::new(),
            started_at: Utc::now(),
            duration: Duration::from_secs(3),
        });

        assert!(session.was_cancelled());
        assert_eq!(session.exit_code(), 0);
        assert!(session.categories[0].to_string().contains("terminated by user"));
    }

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3665)), "1h1m");
    }
}
