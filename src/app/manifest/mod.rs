//! Manifest parsing and canonical URL lists
//!
//! The manifest is only read to produce canonical URL lists, one per
//! category. Everything downstream (reconciliation, job creation) reads the
//! lists, which makes them the resumable checkpoint of a run.
//!
//! # Module Organization
//!
//! - [`types`] - Records, field layouts and parse results
//! - [`parser`] - Raw manifest parsing with line-accurate errors
//! - [`emitter`] - Writing and re-reading canonical URL lists
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use lidar_sync::app::manifest::{ManifestParser, UrlField, write_url_list};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = ManifestParser::new(vec![UrlField::new("LiDAR", 1)]);
//! let parsed = parser.parse_file(Path::new("lidar-2018.csv"))?;
//! let urls = parsed.urls("LiDAR").unwrap_or_default();
//! write_url_list(Path::new("VanLidar2018_urls.csv"), "LiDAR_URL", urls)?;
//! # Ok(())
//! # }
//! ```

pub mod emitter;
pub mod parser;
pub mod types;

use tracing::info;

pub use emitter::{read_url_list, write_url_list};
pub use parser::ManifestParser;
pub use types::{CategoryUrls, ManifestRecord, ParsedManifest, UrlField};

use crate::app::profile::Profile;
use crate::errors::ManifestResult;

/// Parse a profile's manifest and rewrite every category's URL list
///
/// Returns the number of URLs written per category, in category order.
pub fn emit_profile_lists(profile: &Profile) -> ManifestResult<Vec<(String, usize)>> {
    let parser = ManifestParser::new(UrlField::for_profile(profile));
    let parsed = parser.parse_file(&profile.manifest)?;

    let mut written = Vec::with_capacity(profile.categories.len());
    for category in &profile.categories {
        let urls = parsed.urls(&category.name).unwrap_or_default();
        let count = write_url_list(&category.url_list, &category.url_header(), urls)?;
        written.push((category.name.clone(), count));
    }

    info!(
        "Emitted {} canonical URL lists from {} manifest records",
        written.len(),
        parsed.records
    );
    Ok(written)
}
