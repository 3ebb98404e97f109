//! Data models for archive jobs
//!
//! An [`ArchiveJob`] is created lazily from a reconciled URL that is still
//! missing at least one required output. A [`JobOutcome`] is the value the
//! fetch-extract-clean unit hands back after a fully successful run.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::rules::OutputRule;

/// One archive's fetch, extract and cleanup unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    /// Remote archive location
    pub url: Url,
    /// File name derived from the URL path
    pub archive_name: String,
    /// Category destination root; receives the archive and unrouted members
    pub destination: PathBuf,
    /// Routing rules in declared order
    pub rules: Vec<OutputRule>,
    /// Indices into `rules` that were unsatisfied at reconciliation time
    pub missing_rules: Vec<usize>,
}

impl ArchiveJob {
    /// Build a job for `url` routed by `rules`
    ///
    /// Returns `None` when the URL has no file name to save the archive under.
    pub fn new(
        url: Url,
        destination: impl Into<PathBuf>,
        rules: Vec<OutputRule>,
        missing_rules: Vec<usize>,
    ) -> Option<Self> {
        let archive_name = archive_name(&url)?;
        Some(Self {
            url,
            archive_name,
            destination: destination.into(),
            rules,
            missing_rules,
        })
    }

    /// Local path the archive is streamed to
    pub fn archive_path(&self) -> PathBuf {
        self.destination.join(&self.archive_name)
    }

    /// Default directory for members that match no rule
    pub fn default_dir(&self) -> &Path {
        &self.destination
    }

    /// Extensions of the rules that were unsatisfied at reconciliation time
    pub fn missing_extensions(&self) -> Vec<&str> {
        self.missing_rules
            .iter()
            .filter_map(|&i| self.rules.get(i))
            .map(|rule| rule.extension.as_str())
            .collect()
    }
}

/// Counts returned by a successful unit of work
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Bytes written for the archive
    pub bytes_downloaded: u64,
    /// Extracted member count per rule, indexed like the job's rules
    pub extracted: Vec<u64>,
    /// Members that matched no rule and went to the default directory
    pub unrouted: u64,
}

impl JobOutcome {
    pub fn with_rule_count(rule_count: usize) -> Self {
        Self {
            extracted: vec![0; rule_count],
            ..Default::default()
        }
    }

    /// Total members written by this unit
    pub fn total_extracted(&self) -> u64 {
        self.extracted.iter().sum::<u64>() + self.unrouted
    }
}

/// Last non-empty path segment of `url`, percent-decoded
///
/// Extracted members carry the decoded name, so `Tile%201.zip` must map to
/// `Tile 1.zip`. A segment that decodes to a path separator or a dot entry
/// has no usable file name.
pub fn archive_name(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;
    let name = percent_decode_str(segment).decode_utf8_lossy();

    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return None;
    }
    Some(name.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_name_from_url() {
        let url = Url::parse("https://opendata.example.org/lidar/2018/4830E_54560N.zip").unwrap();
        assert_eq!(archive_name(&url).as_deref(), Some("4830E_54560N.zip"));

        let with_query = Url::parse("http://x/A.zip?download=1").unwrap();
        assert_eq!(archive_name(&with_query).as_deref(), Some("A.zip"));

        let root = Url::parse("http://x/").unwrap();
        assert_eq!(archive_name(&root), None);
    }

    #[test]
    fn test_archive_name_is_percent_decoded() {
        let spaced = Url::parse("http://x/las/Tile 1.zip").unwrap();
        assert_eq!(archive_name(&spaced).as_deref(), Some("Tile 1.zip"));

        let encoded = Url::parse("http://x/las/Tile%201%2B2.zip").unwrap();
        assert_eq!(archive_name(&encoded).as_deref(), Some("Tile 1+2.zip"));

        let job = ArchiveJob::new(spaced, "/data", vec![], vec![]).unwrap();
        assert_eq!(job.archive_path(), PathBuf::from("/data/Tile 1.zip"));
    }

    #[test]
    fn test_archive_name_rejects_encoded_separators() {
        let slash = Url::parse("http://x/las/..%2F..%2Fetc.zip").unwrap();
        assert_eq!(archive_name(&slash), None);

        let dots = Url::parse("http://x/las/%2E%2E").unwrap();
        assert_eq!(archive_name(&dots), None);
    }

    #[test]
    fn test_job_archive_path() {
        let url = Url::parse("http://x/B.zip").unwrap();
        let job = ArchiveJob::new(url, "/data/root", vec![], vec![]).unwrap();

        assert_eq!(job.archive_name, "B.zip");
        assert_eq!(job.archive_path(), PathBuf::from("/data/root/B.zip"));
        assert_eq!(job.default_dir(), Path::new("/data/root"));
    }

    #[test]
    fn test_missing_extensions() {
        let rules = vec![
            OutputRule::new(".prj", "/data/prj"),
            OutputRule::new(".las", "/data"),
        ];
        let url = Url::parse("http://x/C.zip").unwrap();
        let job = ArchiveJob::new(url, "/data", rules, vec![1, 7]).unwrap();

        assert_eq!(job.missing_extensions(), vec![".las"]);
    }

    #[test]
    fn test_outcome_totals() {
        let mut outcome = JobOutcome::with_rule_count(2);
        outcome.extracted[0] = 1;
        outcome.extracted[1] = 2;
        outcome.unrouted = 3;
        assert_eq!(outcome.total_extracted(), 6);
    }
}
