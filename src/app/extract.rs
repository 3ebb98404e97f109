//! Routed extraction of downloaded archives
//!
//! Every file member is written under the directory of the first rule whose
//! extension it carries, keeping its path inside the archive. Members that
//! match no rule go to the job's destination root. Directory entries and
//! members whose path would escape the target directory are skipped.
//!
//! Extraction is synchronous; async callers run it on the blocking pool.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::app::models::{ArchiveJob, JobOutcome};
use crate::app::rules::{route, OutputRule};
use crate::errors::{TransferError, TransferFailure, TransferResult, TransferStage};

/// Extract every member of the job's downloaded archive
///
/// `bytes_downloaded` of the returned outcome is left at zero.
///
/// # Errors
///
/// `TransferStage::Open` if the archive cannot be opened or read as a zip,
/// `TransferStage::Extract` if a member cannot be read or written.
pub fn extract_job(job: &ArchiveJob) -> TransferResult<JobOutcome> {
    let file =
        File::open(job.archive_path()).map_err(|e| stage_error(job, TransferStage::Open, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| stage_error(job, TransferStage::Open, e))?;

    let mut outcome = JobOutcome::with_rule_count(job.rules.len());

    for index in 0..archive.len() {
        let mut member = archive
            .by_index(index)
            .map_err(|e| stage_error(job, TransferStage::Extract, e))?;

        if member.is_dir() {
            continue;
        }

        let Some(relative) = member.enclosed_name().map(Path::to_path_buf) else {
            warn!(
                "Skipping member with unsafe path '{}' in {}",
                member.name(),
                job.archive_name
            );
            continue;
        };

        let rule_index = route(&job.rules, member.name());
        let target_dir = OutputRule::target_dir(
            rule_index.and_then(|i| job.rules.get(i)),
            job.default_dir(),
        );
        let output_path = target_dir.join(&relative);

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| stage_error(job, TransferStage::Extract, e))?;
        }

        let mut output =
            File::create(&output_path).map_err(|e| stage_error(job, TransferStage::Extract, e))?;
        io::copy(&mut member, &mut output)
            .map_err(|e| stage_error(job, TransferStage::Extract, e))?;

        debug!("Extracted {} to {}", member.name(), output_path.display());

        match rule_index {
            Some(i) => outcome.extracted[i] += 1,
            None => outcome.unrouted += 1,
        }
    }

    Ok(outcome)
}

fn stage_error(
    job: &ArchiveJob,
    stage: TransferStage,
    source: impl Into<TransferFailure>,
) -> TransferError {
    TransferError::new(job.url.as_str(), job.archive_path(), stage, source)
}
