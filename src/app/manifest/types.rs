//! Core data structures for manifest parsing

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::profile::Profile;

/// One manifest data row
///
/// `fields` holds the first delimited column split on `;`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    line: u64,
    fields: Vec<String>,
}

impl ManifestRecord {
    /// Split the first column of a row into its fields
    pub fn parse(line: u64, first_column: &str, delimiter: char) -> Self {
        Self {
            line,
            fields: first_column.split(delimiter).map(str::to_string).collect(),
        }
    }

    /// Line number in the source file (header is line 1)
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Field at `index`, trimmed
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|f| f.trim())
    }
}

/// Where a category's URL sits inside each record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlField {
    pub category: String,
    pub index: usize,
}

impl UrlField {
    pub fn new(category: impl Into<String>, index: usize) -> Self {
        Self {
            category: category.into(),
            index,
        }
    }

    /// Field layout for every category of a profile
    pub fn for_profile(profile: &Profile) -> Vec<UrlField> {
        profile
            .categories
            .iter()
            .map(|c| UrlField::new(&c.name, c.field_index))
            .collect()
    }
}

/// URLs collected for one category, in manifest order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUrls {
    pub category: String,
    pub urls: Vec<Url>,
}

/// Result of parsing a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedManifest {
    /// Number of data rows read
    pub records: usize,
    /// URLs per category, in the order the fields were declared
    pub categories: Vec<CategoryUrls>,
}

impl ParsedManifest {
    /// URLs of the named category
    pub fn urls(&self, category: &str) -> Option<&[Url]> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.urls.as_slice())
    }
}
