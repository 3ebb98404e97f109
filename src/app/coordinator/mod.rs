//! Sync orchestration
//!
//! The coordinator drives the archive jobs of each category through an
//! [`ArchiveProcessor`], feeds every result to a [`ProgressController`] and
//! watches a [`CancellationToken`] for interrupts. At most `worker_count`
//! jobs run at once; with the default of one, jobs run strictly in list
//! order.
//!
//! # Architecture
//!
//! - [`config`] - Worker count, failure policy and progress settings
//! - [`controller`] - Counter ownership and the Running/Terminating state machine
//! - [`stats`] - Counters, census and reports
//! - [`signals`] - Ctrl-C and SIGTERM handling
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lidar_sync::app::{
//!     builtin_profiles, reconcile, read_url_list, ArchiveClient, CategoryPlan, Coordinator,
//!     CoordinatorConfig,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = builtin_profiles()["van-2018"].resolve("van-2018", ".".as_ref())?;
//! let category = profile.categories[0].clone();
//! let urls = read_url_list(&category.url_list, &category.url_header())?;
//! let jobs = reconcile(&category, &urls).jobs(&category);
//!
//! let coordinator = Coordinator::new(
//!     CoordinatorConfig::default(),
//!     Arc::new(ArchiveClient::new()?),
//!     CancellationToken::new(),
//! );
//! let session = coordinator
//!     .run_session(&profile.name, vec![CategoryPlan::new(category, jobs)])
//!     .await;
//! std::process::exit(session.exit_code());
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod signals;
pub mod stats;

use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::client::ArchiveClient;
use crate::app::models::{ArchiveJob, JobOutcome};
use crate::app::profile::Category;
use crate::app::worker::ArchiveProcessor;
use crate::errors::TransferResult;

pub use config::{CoordinatorConfig, FailurePolicy};
pub use controller::{ControllerState, ProgressController};
pub use signals::SignalHandler;
pub use stats::{
    census, format_duration, CategoryReport, CensusEntry, ExtensionCount, FailureRecord,
    RunCounters, RunOutcome, SessionReport,
};

/// A category together with the jobs reconciliation produced for it
#[derive(Debug, Clone)]
pub struct CategoryPlan {
    pub category: Category,
    pub jobs: Vec<ArchiveJob>,
}

impl CategoryPlan {
    pub fn new(category: Category, jobs: Vec<ArchiveJob>) -> Self {
        Self { category, jobs }
    }
}

/// Main coordinator for running archive jobs
pub struct Coordinator {
    config: CoordinatorConfig,
    processor: ArchiveProcessor,
    cancel: CancellationToken,
    show_progress: bool,
}

impl Coordinator {
    pub fn new(
        config: CoordinatorConfig,
        client: Arc<ArchiveClient>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            processor: ArchiveProcessor::new(client),
            cancel,
            show_progress: false,
        }
    }

    /// Render a progress bar while jobs run
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Run every plan in order, stopping after a cancelled or failed category
    pub async fn run_session(&self, profile: &str, plans: Vec<CategoryPlan>) -> SessionReport {
        let mut session = SessionReport::new(profile);

        for plan in plans {
            let report = self.run_category(&plan.category, plan.jobs).await;
            let outcome = report.outcome;
            session.categories.push(report);

            if outcome != RunOutcome::Completed {
                info!("Not starting further categories after {}", outcome);
                break;
            }
        }

        session
    }

    /// Run the jobs of one category to completion, cancellation or abort
    ///
    /// Always returns a report; failures are recorded in it.
    pub async fn run_category(&self, category: &Category, jobs: Vec<ArchiveJob>) -> CategoryReport {
        let worker_count = self.config.worker_count.max(1);
        let mut controller = ProgressController::new(
            category,
            jobs.len(),
            self.show_progress,
            self.config.progress_update_interval,
        );

        info!(
            "{}: processing {} archives with {} worker(s)",
            category.name,
            jobs.len(),
            worker_count
        );

        let mut pending = jobs.into_iter();
        let mut in_flight: JoinSet<JobTask> = JoinSet::new();

        loop {
            if self.cancel.is_cancelled() {
                controller.terminate(RunOutcome::Cancelled);
            }

            while controller.is_running() && in_flight.len() < worker_count {
                let Some(job) = pending.next() else {
                    break;
                };
                debug!(
                    "Dispatching {} (missing {})",
                    job.url,
                    job.missing_extensions().join(", ")
                );
                let processor = self.processor.clone();
                in_flight.spawn(async move {
                    let name = job.archive_name.clone();
                    (name, processor.process(job).await)
                });
            }

            if !controller.is_running() || in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    controller.terminate(RunOutcome::Cancelled);
                }
                joined = in_flight.join_next() => match joined {
                    Some(joined) => record_joined(&mut controller, joined, self.config.failure_policy),
                    None => break,
                },
            }
        }

        abandon_in_flight(&mut in_flight, &mut controller, self.config.failure_policy);
        controller.finish(category)
    }
}

type JobTask = (String, TransferResult<JobOutcome>);

/// Feed one joined task result to the controller
fn record_joined(
    controller: &mut ProgressController,
    joined: Result<JobTask, JoinError>,
    policy: FailurePolicy,
) {
    match joined {
        Ok((name, Ok(outcome))) => controller.record_success(&name, &outcome),
        Ok((_, Err(err))) => {
            controller.record_failure(&err);
            if policy == FailurePolicy::Abort {
                controller.terminate(RunOutcome::Failed);
            }
        }
        Err(join_err) => {
            controller.record_lost_task(join_err.to_string());
            if policy == FailurePolicy::Abort {
                controller.terminate(RunOutcome::Failed);
            }
        }
    }
}

/// Record tasks that already finished, then abort the rest
///
/// A unit that completed before termination was noticed has already
/// extracted its members and removed its archive, so its counts still
/// belong in the report.
fn abandon_in_flight(
    in_flight: &mut JoinSet<JobTask>,
    controller: &mut ProgressController,
    policy: FailurePolicy,
) {
    while let Some(joined) = in_flight.try_join_next() {
        record_joined(controller, joined, policy);
    }

    if !in_flight.is_empty() {
        info!("Abandoning {} in-flight archive job(s)", in_flight.len());
        in_flight.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rules::OutputRule;
    use std::path::Path;
    use std::time::Duration;
    use url::Url;

    fn category(root: &Path) -> Category {
        Category {
            name: "LiDAR".to_string(),
            field_index: 1,
            url_list: root.join("urls.csv"),
            destination: root.to_path_buf(),
            rules: vec![OutputRule::new(".las", root)],
        }
    }

    fn coordinator(cancel: CancellationToken) -> Coordinator {
        Coordinator::new(
            CoordinatorConfig::default(),
            Arc::new(ArchiveClient::new().unwrap()),
            cancel,
        )
    }

    #[tokio::test]
    async fn test_empty_job_list_completes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path());

        let report = coordinator(CancellationToken::new())
            .run_category(&category, Vec::new())
            .await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.scheduled, 0);
        assert_eq!(report.census.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_dispatches_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path());
        let job = ArchiveJob::new(
            Url::parse("http://127.0.0.1:9/A.zip").unwrap(),
            temp_dir.path(),
            category.rules.clone(),
            vec![0],
        )
        .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = coordinator(cancel).run_category(&category, vec![job]).await;

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.counters.archives_downloaded, 0);
        assert!(report.failures.is_empty());
        assert!(!temp_dir.path().join("A.zip").exists());
    }

    #[tokio::test]
    async fn test_session_stops_after_cancelled_category() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = category(&temp_dir.path().join("first"));
        let second = category(&temp_dir.path().join("second"));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let session = coordinator(cancel)
            .run_session(
                "van-2013",
                vec![
                    CategoryPlan::new(first, Vec::new()),
                    CategoryPlan::new(second, Vec::new()),
                ],
            )
            .await;

        assert_eq!(session.categories.len(), 1);
        assert!(session.was_cancelled());
        assert_eq!(session.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_recorded_before_abandoning() {
        let temp_dir = tempfile::tempdir().unwrap();
        let category = category(temp_dir.path());
        let mut controller = ProgressController::new(&category, 2, false, Duration::from_millis(50));

        let mut in_flight: JoinSet<JobTask> = JoinSet::new();
        in_flight.spawn(async {
            let mut outcome = JobOutcome::with_rule_count(1);
            outcome.extracted[0] = 3;
            ("A.zip".to_string(), Ok(outcome))
        });
        in_flight.spawn(std::future::pending::<JobTask>());
        tokio::time::sleep(Duration::from_millis(50)).await;

        controller.terminate(RunOutcome::Cancelled);
        abandon_in_flight(&mut in_flight, &mut controller, FailurePolicy::Abort);

        assert_eq!(controller.counters().archives_downloaded, 1);
        assert_eq!(controller.counters().extracted_for(".las"), 3);
        assert_eq!(
            controller.state(),
            ControllerState::Terminating(RunOutcome::Cancelled)
        );
    }
}
