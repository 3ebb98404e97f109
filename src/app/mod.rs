//! Core application logic for LiDAR Sync
//!
//! This module contains the fetch-reconcile-extract pipeline: manifest
//! parsing and canonical URL lists, reconciliation against the local tree,
//! the per-archive fetch-extract-clean unit and the coordinator that runs
//! units and reports on them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use lidar_sync::app::{builtin_profiles, emit_profile_lists, reconcile, read_url_list};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = builtin_profiles()["van-2022"].resolve("van-2022", ".".as_ref())?;
//! emit_profile_lists(&profile)?;
//!
//! for category in &profile.categories {
//!     let urls = read_url_list(&category.url_list, &category.url_header())?;
//!     let report = reconcile(category, &urls);
//!     println!("{}: {} archives missing", category.name, report.pending_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod extract;
pub mod manifest;
pub mod models;
pub mod profile;
pub mod reconcile;
pub mod rules;
pub mod worker;

// Re-export main public API
pub use client::{ArchiveClient, ClientConfig};
pub use coordinator::{
    census, CategoryPlan, CategoryReport, CensusEntry, Coordinator, CoordinatorConfig,
    FailurePolicy, RunCounters, RunOutcome, SessionReport, SignalHandler,
};
pub use extract::extract_job;
pub use manifest::{emit_profile_lists, read_url_list, write_url_list, ManifestParser, UrlField};
pub use models::{archive_name, ArchiveJob, JobOutcome};
pub use profile::{builtin_profiles, Category, Profile, ProfileSpec};
pub use reconcile::{reconcile, ReconciliationReport, RuleTally};
pub use rules::{OutputRule, Requirement};
pub use worker::ArchiveProcessor;
