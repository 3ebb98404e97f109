//! LiDAR Sync Library
//!
//! A Rust library for mirroring remote collections of zipped LiDAR and
//! GeoTIFF tiles. A tile manifest becomes canonical URL lists, the lists are
//! reconciled against extracted outputs on disk, and only the archives whose
//! outputs are missing are fetched, extracted and removed.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
