//! Error types for LiDAR Sync
//!
//! Errors are grouped by pipeline phase. Manifest errors abort before any
//! network access; transfer errors always carry the identity of the archive
//! job that failed so the orchestrator can report it.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Manifest parsing and canonical URL list errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// A data row does not have enough `;`-separated fields
    #[error(
        "Malformed manifest record at line {line}: field {required_index} required, only {found} present"
    )]
    MalformedRecord {
        line: u64,
        required_index: usize,
        found: usize,
    },

    /// A URL field could not be parsed as an absolute URL
    #[error("Invalid URL at line {line}: {url} ({reason})")]
    InvalidUrl {
        line: u64,
        url: String,
        reason: String,
    },

    /// The manifest or URL list has no header row
    #[error("Missing header row in {path}")]
    MissingHeader { path: PathBuf },

    /// Delimited text error
    #[error("Delimited text error")]
    Csv(#[from] csv::Error),

    /// I/O error reading or writing manifest data
    #[error("I/O error reading manifest data")]
    Io(#[from] std::io::Error),
}

/// Phase of the fetch-extract-clean unit in which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStage {
    Download,
    Open,
    Extract,
    Cleanup,
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStage::Download => "download",
            TransferStage::Open => "archive open",
            TransferStage::Extract => "extraction",
            TransferStage::Cleanup => "archive removal",
        };
        f.write_str(name)
    }
}

/// Underlying cause of a transfer failure
#[derive(Error, Debug)]
pub enum TransferFailure {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("Server responded with HTTP {status}")]
    Status { status: u16 },

    /// No data received within the read timeout
    #[error("No data received within {timeout:?}")]
    Timeout { timeout: Duration },

    /// Archive could not be read
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking extraction task did not complete
    #[error("Extraction task failed: {0}")]
    Join(String),
}

/// Failure of one archive job, tagged with the job identity
#[derive(Error, Debug)]
#[error("{stage} failed for {url}: {source}")]
pub struct TransferError {
    /// URL of the archive
    pub url: String,
    /// Local path of the (possibly partial) archive file
    pub archive_path: PathBuf,
    /// Step that failed
    pub stage: TransferStage,
    /// Underlying cause
    #[source]
    pub source: TransferFailure,
}

impl TransferError {
    pub fn new(
        url: impl Into<String>,
        archive_path: impl Into<PathBuf>,
        stage: TransferStage,
        source: impl Into<TransferFailure>,
    ) -> Self {
        Self {
            url: url.into(),
            archive_path: archive_path.into(),
            stage,
            source: source.into(),
        }
    }

    /// Whether the failure came from the network rather than the archive or disk
    pub fn is_network(&self) -> bool {
        matches!(
            self.source,
            TransferFailure::Http(_) | TransferFailure::Status { .. } | TransferFailure::Timeout { .. }
        )
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Configuration serialization failed")]
    Serialize(#[from] toml::ser::Error),

    /// Unknown profile name
    #[error("Unknown profile '{name}'. Run 'profiles' to list available profiles")]
    UnknownProfile { name: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// HTTP client could not be built from the configuration
    #[error("HTTP client construction failed")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },

    /// I/O error reading or writing configuration
    #[error("Configuration I/O error")]
    Io(#[from] std::io::Error),
}

/// Progress and report output errors
#[derive(Error, Debug)]
pub enum ProgressError {
    /// Progress bar template was rejected
    #[error("Invalid progress template: {reason}")]
    Template { reason: String },

    /// Summary could not be serialized
    #[error("Summary serialization failed")]
    Serialize(#[from] serde_json::Error),

    /// Terminal or file output error
    #[error("Report output error")]
    Output(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Transfer error
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Progress error
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Manifest(_) => "manifest",
            AppError::Transfer(_) => "transfer",
            AppError::Config(_) => "config",
            AppError::Progress(_) => "progress",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Transfer result type alias
pub type TransferResult<T> = std::result::Result<T, TransferError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_message_names_line() {
        let err = ManifestError::MalformedRecord {
            line: 7,
            required_index: 2,
            found: 2,
        };
        let message = err.to_string();
        assert!(message.contains("line 7"));
        assert!(message.contains("field 2"));
    }

    #[test]
    fn test_transfer_error_carries_job_identity() {
        let err = TransferError::new(
            "http://x/A.zip",
            "/tmp/A.zip",
            TransferStage::Download,
            TransferFailure::Status { status: 404 },
        );

        assert_eq!(err.url, "http://x/A.zip");
        assert!(err.is_network());
        assert!(err.to_string().contains("download failed for http://x/A.zip"));

        let app_error = AppError::from(err);
        assert_eq!(app_error.category(), "transfer");
    }

    #[test]
    fn test_archive_failure_is_not_network() {
        let err = TransferError::new(
            "http://x/B.zip",
            "/tmp/B.zip",
            TransferStage::Open,
            TransferFailure::Archive(zip::result::ZipError::InvalidArchive("bad")),
        );
        assert!(!err.is_network());
        assert_eq!(err.stage.to_string(), "archive open");
    }
}
