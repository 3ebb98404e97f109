//! Fetch-extract-clean processing of one archive
//!
//! The three steps run in strict order and a later step never starts if an
//! earlier one failed. The archive file is only removed after every member
//! has been written, so a failed job leaves the (possibly partial) archive
//! on disk and the missing outputs absent; the next run's reconciliation
//! schedules it again.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::app::client::ArchiveClient;
use crate::app::extract::extract_job;
use crate::app::models::{ArchiveJob, JobOutcome};
use crate::errors::{TransferError, TransferFailure, TransferResult, TransferStage};

/// Runs archive jobs against a shared client
///
/// Holds no counters; the caller applies the returned [`JobOutcome`].
#[derive(Debug, Clone)]
pub struct ArchiveProcessor {
    client: Arc<ArchiveClient>,
}

impl ArchiveProcessor {
    pub fn new(client: Arc<ArchiveClient>) -> Self {
        Self { client }
    }

    /// Download, extract and remove the archive of `job`
    ///
    /// # Errors
    ///
    /// Returns a `TransferError` tagged with the job's URL, archive path and
    /// the step that failed.
    pub async fn process(&self, job: ArchiveJob) -> TransferResult<JobOutcome> {
        let started = Instant::now();
        let archive_path = job.archive_path();

        info!("Downloading {}", job.archive_name);
        let bytes_downloaded = self
            .client
            .download_file(&job.url, &archive_path)
            .await
            .map_err(|e| {
                TransferError::new(job.url.as_str(), &archive_path, TransferStage::Download, e)
            })?;

        debug!("Extracting {} ({} bytes)", job.archive_name, bytes_downloaded);
        let url = job.url.to_string();
        let extracted = tokio::task::spawn_blocking(move || extract_job(&job))
            .await
            .map_err(|e| {
                TransferError::new(
                    url.as_str(),
                    &archive_path,
                    TransferStage::Extract,
                    TransferFailure::Join(e.to_string()),
                )
            })??;

        tokio::fs::remove_file(&archive_path).await.map_err(|e| {
            TransferError::new(url.as_str(), &archive_path, TransferStage::Cleanup, e)
        })?;

        info!(
            "Finished {} in {:.1?}: {} members extracted",
            archive_path.display(),
            started.elapsed(),
            extracted.total_extracted()
        );

        Ok(JobOutcome {
            bytes_downloaded,
            ..extracted
        })
    }
}
