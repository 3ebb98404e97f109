//! Output rules: extension to directory routing
//!
//! An [`OutputRule`] serves two purposes. Before any network access it
//! decides whether an archive's expected output already exists on disk, and
//! during extraction it decides where a member of that extension is written.
//! Rules are always evaluated in declared order so that overlapping
//! extensions route deterministically.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::ARCHIVE_EXTENSION;

/// Whether an absent output makes its archive worth fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    /// Absence of the output schedules a fetch of the archive
    #[default]
    Required,
    /// Absence is reported but never schedules a fetch by itself
    Companion,
}

/// Routing and satisfaction policy for one file extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRule {
    /// Extension including the leading dot, e.g. `.las`
    pub extension: String,
    /// Directory that receives members with this extension
    pub directory: PathBuf,
    /// Fetch policy when the output is missing
    #[serde(default)]
    pub requirement: Requirement,
}

impl OutputRule {
    /// Create a required rule, normalizing the extension to start with a dot
    pub fn new(extension: impl AsRef<str>, directory: impl Into<PathBuf>) -> Self {
        Self {
            extension: normalize_extension(extension.as_ref()),
            directory: directory.into(),
            requirement: Requirement::Required,
        }
    }

    /// Mark this rule as a companion output
    pub fn companion(mut self) -> Self {
        self.requirement = Requirement::Companion;
        self
    }

    /// Short label without the leading dot, used in reports
    pub fn label(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }

    /// Whether an archive member (or any file name) carries this rule's extension
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.extension)
    }

    /// Path where this rule expects the output derived from `archive_name`
    pub fn expected_output(&self, archive_name: &str) -> PathBuf {
        self.directory
            .join(output_file_name(archive_name, &self.extension))
    }

    /// Whether the expected output for `archive_name` exists on disk
    pub fn is_satisfied(&self, archive_name: &str) -> bool {
        self.expected_output(archive_name).exists()
    }

    /// Directory a member lands in, falling back to `default_dir`
    pub fn target_dir<'a>(rule: Option<&'a OutputRule>, default_dir: &'a Path) -> &'a Path {
        rule.map(|r| r.directory.as_path()).unwrap_or(default_dir)
    }
}

/// Index of the first rule matching `member_name`, in declared order
pub fn route(rules: &[OutputRule], member_name: &str) -> Option<usize> {
    rules.iter().position(|rule| rule.matches(member_name))
}

/// Replace the archive extension of `archive_name` with `extension`
///
/// `A.zip` with `.las` becomes `A.las`. Names without the archive extension
/// lose their last extension instead, and names without any extension get
/// `extension` appended.
pub fn output_file_name(archive_name: &str, extension: &str) -> String {
    let stem = archive_name
        .strip_suffix(ARCHIVE_EXTENSION)
        .or_else(|| archive_name.rsplit_once('.').map(|(stem, _)| stem))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(archive_name);
    format!("{}{}", stem, extension)
}

/// Ensure an extension starts with a single dot
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.');
    format!(".{}", trimmed)
}
