//! Prelude module for LiDAR Sync Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use lidar_sync::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use lidar_sync::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let profile = builtin_profiles()["van-2018"].resolve("van-2018", Path::new("."))?;
//!     profile.ensure_directories()?;
//!     emit_profile_lists(&profile)?;
//!
//!     let mut plans = Vec::new();
//!     for category in &profile.categories {
//!         let urls = read_url_list(&category.url_list, &category.url_header())?;
//!         let jobs = reconcile(category, &urls).jobs(category);
//!         plans.push(CategoryPlan::new(category.clone(), jobs));
//!     }
//!
//!     let client = Arc::new(ArchiveClient::new()?);
//!     let coordinator = Coordinator::new(CoordinatorConfig::default(), client, CancellationToken::new());
//!     let session = coordinator.run_session(&profile.name, plans).await;
//!     std::process::exit(session.exit_code());
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    // Manifest and lists
    builtin_profiles,
    census,
    emit_profile_lists,
    read_url_list,
    reconcile,
    write_url_list,

    // Core orchestration
    ArchiveClient,
    ArchiveJob,
    ArchiveProcessor,
    CategoryPlan,
    Category,
    ClientConfig,
    Coordinator,
    CoordinatorConfig,
    FailurePolicy,
    OutputRule,
    Profile,

    // Result and status types
    CategoryReport,
    ReconciliationReport,
    RunOutcome,
    SessionReport,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_READ_TIMEOUT, DEFAULT_WORKER_COUNT, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
pub use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _client_config = ClientConfig::default();
        let coordinator_config = CoordinatorConfig::default();

        assert_eq!(coordinator_config.worker_count, DEFAULT_WORKER_COUNT);
        assert_eq!(coordinator_config.failure_policy, FailurePolicy::Abort);
        assert!(USER_AGENT.starts_with("lidar-sync/"));
    }

    #[test]
    fn test_profiles_resolve_through_prelude() {
        let root = PathBuf::from("/data");
        let profile = builtin_profiles()["van-2013"]
            .resolve("van-2013", &root)
            .unwrap();

        assert_eq!(profile.categories.len(), 2);
        assert!(profile.categories[0].destination.starts_with(&root));
    }
}
