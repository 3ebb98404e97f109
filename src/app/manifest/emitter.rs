//! Canonical URL lists
//!
//! Each category's URLs are written to a single-column delimited list with a
//! `<Category>_URL` header. The list is fully derived from the manifest and
//! is rewritten unconditionally; later runs reconcile from it instead of the
//! raw manifest.

use std::path::Path;

use tracing::{info, warn};
use url::Url;

use crate::errors::{ManifestError, ManifestResult};

/// Write `urls` to `path` under `header`, replacing any previous list
///
/// Returns the number of URLs written.
pub fn write_url_list(path: &Path, header: &str, urls: &[Url]) -> ManifestResult<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    writer.write_record([header])?;
    for url in urls {
        writer.write_record([url.as_str()])?;
    }
    writer.flush()?;

    info!("{} {} saved to {}", urls.len(), header, path.display());
    Ok(urls.len())
}

/// Read a canonical URL list back, preserving order
///
/// Blank rows are ignored. A header other than `expected_header` is logged
/// but tolerated.
pub fn read_url_list(path: &Path, expected_header: &str) -> ManifestResult<Vec<Url>> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let header = reader.headers()?.get(0).unwrap_or("").to_string();
    if header.is_empty() {
        return Err(ManifestError::MissingHeader {
            path: path.to_path_buf(),
        });
    }
    if header != expected_header {
        warn!(
            "URL list {} has header '{}', expected '{}'",
            path.display(),
            header,
            expected_header
        );
    }

    let mut urls = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let raw = row.get(0).map(str::trim).unwrap_or("");
        if raw.is_empty() {
            continue;
        }
        let line = row.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
        let url = Url::parse(raw).map_err(|e| ManifestError::InvalidUrl {
            line,
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        urls.push(url);
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(raw: &[&str]) -> Vec<Url> {
        raw.iter().map(|u| Url::parse(u).unwrap()).collect()
    }

    #[test]
    fn test_written_list_has_header_and_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("VanLidar2018_urls.csv");
        let list = urls(&["http://x/B.zip", "http://x/A.zip"]);

        let written = write_url_list(&path, "LiDAR_URL", &list).unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "LiDAR_URL\nhttp://x/B.zip\nhttp://x/A.zip\n");

        let read_back = read_url_list(&path, "LiDAR_URL").unwrap();
        assert_eq!(read_back, list);
    }

    #[test]
    fn test_rewrite_replaces_previous_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("urls.csv");

        write_url_list(&path, "LiDAR_URL", &urls(&["http://x/A.zip", "http://x/B.zip"])).unwrap();
        write_url_list(&path, "LiDAR_URL", &urls(&["http://x/C.zip"])).unwrap();

        let read_back = read_url_list(&path, "LiDAR_URL").unwrap();
        assert_eq!(read_back, urls(&["http://x/C.zip"]));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("urls.csv");
        std::fs::write(&path, "GeoTIFF_URL\nhttp://x/A.zip\n\nhttp://x/B.zip\n").unwrap();

        let read_back = read_url_list(&path, "GeoTIFF_URL").unwrap();
        assert_eq!(read_back.len(), 2);
    }

    #[test]
    fn test_missing_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = read_url_list(&temp_dir.path().join("none.csv"), "LiDAR_URL");
        assert!(matches!(result, Err(ManifestError::NotFound { .. })));
    }

    #[test]
    fn test_empty_file_has_no_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let result = read_url_list(&path, "LiDAR_URL");
        assert!(matches!(result, Err(ManifestError::MissingHeader { .. })));
    }
}
