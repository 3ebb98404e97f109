//! Reconciliation of canonical URLs against the local filesystem
//!
//! Reconciliation is a read-only pass over every URL of a category that
//! checks, rule by rule, whether the expected output already exists. It
//! always runs to completion before any network access so the caller can
//! show an accurate "N archives missing" estimate, and it is recomputed on
//! every run rather than persisted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::models::{archive_name, ArchiveJob};
use crate::app::profile::Category;
use crate::app::rules::Requirement;

/// Satisfied/missing counts for one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTally {
    pub extension: String,
    pub directory: PathBuf,
    pub requirement: Requirement,
    /// Expected outputs already on disk
    pub satisfied: usize,
    /// Expected outputs absent from disk
    pub missing: usize,
}

/// Per-URL reconciliation state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledEntry {
    pub url: Url,
    pub archive_name: String,
    /// Indices of rules whose expected output is absent
    pub unsatisfied: Vec<usize>,
}

/// Outcome of reconciling one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub category: String,
    pub entries: Vec<ReconciledEntry>,
    pub tallies: Vec<RuleTally>,
    /// URLs without a file name, which can never be reconciled
    pub unnamed: Vec<Url>,
}

impl ReconciliationReport {
    /// Number of URLs examined (named ones only)
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Entries that will become jobs
    pub fn pending(&self) -> impl Iterator<Item = &ReconciledEntry> + '_ {
        self.entries
            .iter()
            .filter(move |entry| self.needs_fetch(entry))
    }

    /// Number of archives that will be fetched
    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// Whether an entry misses at least one required output
    pub fn needs_fetch(&self, entry: &ReconciledEntry) -> bool {
        entry.unsatisfied.iter().any(|&i| {
            self.tallies
                .get(i)
                .map(|t| t.requirement == Requirement::Required)
                .unwrap_or(false)
        })
    }

    /// Build archive jobs for every pending entry, in list order
    ///
    /// Entries whose every required output exists never produce a job.
    pub fn jobs(&self, category: &Category) -> Vec<ArchiveJob> {
        self.pending()
            .filter_map(|entry| {
                ArchiveJob::new(
                    entry.url.clone(),
                    &category.destination,
                    category.rules.clone(),
                    entry.unsatisfied.clone(),
                )
            })
            .collect()
    }
}

/// Reconcile `urls` against the outputs declared by `category`
///
/// Performs only existence checks; no file is created or modified.
pub fn reconcile(category: &Category, urls: &[Url]) -> ReconciliationReport {
    info!(
        "Cross-checking {} {} URLs against {}",
        urls.len(),
        category.name,
        category.destination.display()
    );

    let mut tallies: Vec<RuleTally> = category
        .rules
        .iter()
        .map(|rule| RuleTally {
            extension: rule.extension.clone(),
            directory: rule.directory.clone(),
            requirement: rule.requirement,
            satisfied: 0,
            missing: 0,
        })
        .collect();

    let mut entries = Vec::with_capacity(urls.len());
    let mut unnamed = Vec::new();

    for url in urls {
        let Some(name) = archive_name(url) else {
            warn!("Skipping URL without a file name: {}", url);
            unnamed.push(url.clone());
            continue;
        };

        let mut unsatisfied = Vec::new();
        for (i, rule) in category.rules.iter().enumerate() {
            if rule.is_satisfied(&name) {
                tallies[i].satisfied += 1;
            } else {
                tallies[i].missing += 1;
                unsatisfied.push(i);
            }
        }

        entries.push(ReconciledEntry {
            url: url.clone(),
            archive_name: name,
            unsatisfied,
        });
    }

    for tally in &tallies {
        debug!(
            "{}: {} {} files already exist, {} missing",
            category.name, tally.satisfied, tally.extension, tally.missing
        );
    }

    ReconciliationReport {
        category: category.name.clone(),
        entries,
        tallies,
        unnamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rules::OutputRule;
    use std::path::Path;

    fn category(root: &Path, prj_optional: bool) -> Category {
        let prj = OutputRule::new(".prj", root.join("prj"));
        Category {
            name: "LiDAR".to_string(),
            field_index: 1,
            url_list: root.join("urls.csv"),
            destination: root.to_path_buf(),
            rules: vec![
                if prj_optional { prj.companion() } else { prj },
                OutputRule::new(".las", root),
            ],
        }
    }

    fn urls() -> Vec<Url> {
        vec![
            Url::parse("http://x/A.zip").unwrap(),
            Url::parse("http://x/B.zip").unwrap(),
        ]
    }

    #[test]
    fn test_empty_tree_is_all_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path(), false);

        let report = reconcile(&category, &urls());

        assert_eq!(report.total(), 2);
        assert_eq!(report.tallies[0].missing, 2);
        assert_eq!(report.tallies[1].missing, 2);
        assert_eq!(report.pending_count(), 2);
        assert_eq!(report.jobs(&category).len(), 2);
    }

    #[test]
    fn test_complete_archive_never_becomes_job() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path(), false);
        std::fs::create_dir_all(temp_dir.path().join("prj")).unwrap();
        std::fs::write(temp_dir.path().join("A.las"), b"").unwrap();
        std::fs::write(temp_dir.path().join("prj/A.prj"), b"").unwrap();

        let report = reconcile(&category, &urls());
        let jobs = report.jobs(&category);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].archive_name, "B.zip");
        assert_eq!(report.tallies[0].satisfied, 1);
        assert_eq!(report.tallies[1].satisfied, 1);
    }

    #[test]
    fn test_partially_present_archive_is_refetched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path(), false);
        std::fs::write(temp_dir.path().join("A.las"), b"").unwrap();

        let report = reconcile(&category, &urls());
        let jobs = report.jobs(&category);

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].missing_rules, vec![0]);
    }

    #[test]
    fn test_companion_rule_alone_does_not_schedule_fetch() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path(), true);
        std::fs::write(temp_dir.path().join("A.las"), b"").unwrap();

        let report = reconcile(&category, &urls());

        assert_eq!(report.tallies[0].missing, 2);
        let jobs = report.jobs(&category);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].archive_name, "B.zip");
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path(), false);
        std::fs::write(temp_dir.path().join("B.las"), b"").unwrap();

        let first = reconcile(&category, &urls());
        let second = reconcile(&category, &urls());

        assert_eq!(first, second);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unnamed_urls_are_set_aside() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path(), false);
        let urls = vec![Url::parse("http://x/").unwrap()];

        let report = reconcile(&category, &urls);
        assert_eq!(report.total(), 0);
        assert_eq!(report.unnamed.len(), 1);
    }
}
