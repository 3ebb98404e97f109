//! Manifest parser
//!
//! Reads the raw delimited manifest (header row plus data rows), splits the
//! first column of each row on `;` and picks the URL of every category from
//! its fixed field position. A row that is too short aborts the whole parse:
//! skipping it would silently shift the canonical list.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};
use url::Url;

use super::types::{CategoryUrls, ManifestRecord, ParsedManifest, UrlField};
use crate::constants::FIELD_DELIMITER;
use crate::errors::{ManifestError, ManifestResult};

/// Parser for one manifest layout
#[derive(Debug, Clone)]
pub struct ManifestParser {
    fields: Vec<UrlField>,
}

impl ManifestParser {
    pub fn new(fields: Vec<UrlField>) -> Self {
        Self { fields }
    }

    /// Parse a manifest file
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotFound` if the file does not exist,
    /// `MalformedRecord` for a short row and `InvalidUrl` for a field that is
    /// not an absolute URL.
    pub fn parse_file(&self, path: &Path) -> ManifestResult<ParsedManifest> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }

        info!("Parsing manifest {}", path.display());
        let file = File::open(path)?;
        self.parse_reader(file)
    }

    /// Parse manifest content from any reader
    pub fn parse_reader<R: Read>(&self, reader: R) -> ManifestResult<ParsedManifest> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut categories: Vec<CategoryUrls> = self
            .fields
            .iter()
            .map(|field| CategoryUrls {
                category: field.category.clone(),
                urls: Vec::new(),
            })
            .collect();

        let mut records = 0;
        for (i, row) in csv_reader.records().enumerate() {
            let row = row?;
            let line = row
                .position()
                .map(|p| p.line())
                .unwrap_or(i as u64 + 2);
            let record = ManifestRecord::parse(line, row.get(0).unwrap_or(""), FIELD_DELIMITER);

            for (field, bucket) in self.fields.iter().zip(categories.iter_mut()) {
                bucket.urls.push(extract_url(&record, field.index)?);
            }
            records += 1;
        }

        debug!(
            "Parsed {} manifest records into {} categories",
            records,
            categories.len()
        );

        Ok(ParsedManifest {
            records,
            categories,
        })
    }
}

/// URL at `index` of `record`
fn extract_url(record: &ManifestRecord, index: usize) -> ManifestResult<Url> {
    let raw = record
        .field(index)
        .ok_or(ManifestError::MalformedRecord {
            line: record.line(),
            required_index: index,
            found: record.fields().len(),
        })?;

    Url::parse(raw).map_err(|e| ManifestError::InvalidUrl {
        line: record.line(),
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
