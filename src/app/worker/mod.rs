//! Archive job processing
//!
//! An [`ArchiveProcessor`] performs one job's download, routed extraction
//! and archive removal. It is shared by every concurrent job of a run and
//! reports results by value; counting is left to the coordinator.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lidar_sync::app::{ArchiveClient, ArchiveJob, ArchiveProcessor, OutputRule};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let processor = ArchiveProcessor::new(Arc::new(ArchiveClient::new()?));
//! let job = ArchiveJob::new(
//!     Url::parse("https://opendata.example.org/lidar/A.zip")?,
//!     "VanLidar2018",
//!     vec![OutputRule::new(".las", "VanLidar2018")],
//!     vec![0],
//! )
//! .ok_or("URL has no file name")?;
//!
//! let outcome = processor.process(job).await?;
//! println!("{} members extracted", outcome.total_extracted());
//! # Ok(())
//! # }
//! ```

pub mod core;

pub use self::core::ArchiveProcessor;
