//! Console rendering for reconciliation, census and session summaries
//!
//! Progress bars themselves are owned by the coordinator; this module
//! decides whether they are shown and renders the plain-text summaries
//! printed before and after a run.

use std::fmt::Write as _;

use crate::app::{CensusEntry, ReconciliationReport, Requirement, SessionReport};

/// Whether live progress bars should be drawn
///
/// Bars are hidden in quiet mode and when stderr is not a terminal.
pub fn should_show_progress(quiet: bool) -> bool {
    !quiet && atty::is(atty::Stream::Stderr)
}

/// Per-rule present/missing counts of one category
pub fn format_reconciliation(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} archives listed, {} to fetch",
        report.category,
        report.total(),
        report.pending_count()
    );
    for tally in &report.tallies {
        let note = match tally.requirement {
            Requirement::Required => "",
            Requirement::Companion => " (companion)",
        };
        let _ = writeln!(
            out,
            "  {}{}: {} present, {} missing in {}",
            tally.extension,
            note,
            tally.satisfied,
            tally.missing,
            tally.directory.display()
        );
    }
    if !report.unnamed.is_empty() {
        let _ = writeln!(
            out,
            "  {} URLs without a file name were ignored",
            report.unnamed.len()
        );
    }
    out
}

/// On-disk counts of one category
pub fn format_census(category: &str, entries: &[CensusEntry]) -> String {
    let mut out = format!("{}:\n", category);
    for entry in entries {
        let _ = writeln!(
            out,
            "  {} {} files in {}",
            entry.count,
            entry.extension,
            entry.directory.display()
        );
    }
    out
}

/// Final report of a sync session
pub fn format_session(session: &SessionReport) -> String {
    let mut out = String::new();
    for report in &session.categories {
        out.push_str(&report.to_string());
    }
    if session.was_cancelled() {
        out.push_str("Terminated by user\n");
    } else if session.has_failures() {
        out.push_str("Finished with failures; re-run to retry the missing archives\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{reconcile, Category, OutputRule};
    use std::path::Path;
    use url::Url;

    #[test]
    fn test_reconciliation_rendering() {
        let root = Path::new("/nonexistent/lidar");
        let category = Category {
            name: "LiDAR".to_string(),
            field_index: 1,
            url_list: root.join("urls.csv"),
            destination: root.to_path_buf(),
            rules: vec![
                OutputRule::new(".las", root),
                OutputRule::new(".prj", root.join("prj")).companion(),
            ],
        };
        let urls = vec![Url::parse("http://x/A.zip").unwrap()];

        let rendered = format_reconciliation(&reconcile(&category, &urls));

        assert!(rendered.starts_with("LiDAR: 1 archives listed, 1 to fetch"));
        assert!(rendered.contains(".las: 0 present, 1 missing"));
        assert!(rendered.contains(".prj (companion): 0 present, 1 missing"));
    }

    #[test]
    fn test_census_rendering() {
        let entries = vec![CensusEntry {
            extension: ".tif".to_string(),
            directory: "VanGeoTiff2013".into(),
            count: 12,
        }];
        assert_eq!(
            format_census("GeoTIFF", &entries),
            "GeoTIFF:\n  12 .tif files in VanGeoTiff2013\n"
        );
    }

    #[test]
    fn test_empty_session_renders_nothing() {
        assert!(format_session(&SessionReport::new("van-2018")).is_empty());
    }
}
