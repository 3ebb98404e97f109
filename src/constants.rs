//! Application constants for LiDAR Sync
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the configuration file location
    pub const CONFIG_PATH: &str = "LIDAR_SYNC_CONFIG";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("lidar-sync/", env!("CARGO_PKG_VERSION"));

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Maximum silence on a download stream before it is abandoned
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;

    /// Default request rate (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;
}

/// Manifest and canonical list formats
pub mod manifest {
    /// Separator inside the first manifest column
    pub const FIELD_DELIMITER: char = ';';

    /// Suffix appended to the category name to form the URL list header
    pub const URL_HEADER_SUFFIX: &str = "_URL";

    /// Extension of the remote archives
    pub const ARCHIVE_EXTENSION: &str = ".zip";
}

/// Worker and coordination constants
pub mod workers {
    /// Default number of concurrent archive jobs (sequential)
    pub const DEFAULT_WORKER_COUNT: usize = 1;

    /// Upper bound on concurrent archive jobs
    pub const MAX_WORKER_COUNT: usize = 16;
}

/// Interactive prompt constants
pub mod prompt {
    /// Answers accepted as confirmation (compared case-insensitively)
    pub const ACCEPTED_ANSWERS: &[&str] = &["y", "yes"];
}

/// Configuration file locations
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_FILE_NAME: &str = "lidar-sync.toml";

    /// Directory under the user config dir
    pub const APP_DIR_NAME: &str = "lidar-sync";

    /// File name inside the user config dir
    pub const FILE_NAME: &str = "config.toml";
}

/// Progress display constants
pub mod progress {
    use super::Duration;

    /// Progress bar redraw interval
    pub const TICK_INTERVAL: Duration = Duration::from_millis(120);

    /// Progress bar template
    pub const BAR_TEMPLATE: &str =
        "{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} archives {msg}";
}

// Re-export commonly used constants at the top level
pub use http::{DEFAULT_RATE_LIMIT_RPS, DEFAULT_READ_TIMEOUT, USER_AGENT};
pub use manifest::{ARCHIVE_EXTENSION, FIELD_DELIMITER, URL_HEADER_SUFFIX};
pub use workers::{DEFAULT_WORKER_COUNT, MAX_WORKER_COUNT};
