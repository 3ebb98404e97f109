//! Progress and interrupt controller
//!
//! The controller is the only owner of a category's [`RunCounters`]. It
//! starts `Running` and moves to `Terminating` at most once, either on a
//! cancellation request or on a failed job under the abort policy. Normal
//! completion, cancellation and fatal failure all end in [`finish`], which
//! takes the census and builds the report.
//!
//! [`finish`]: ProgressController::finish

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use super::stats::{census, CategoryReport, FailureRecord, RunCounters, RunOutcome};
use crate::app::models::JobOutcome;
use crate::app::profile::Category;
use crate::constants::progress;
use crate::errors::{ProgressError, TransferError};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Running,
    /// No further job may start; the cause becomes the report outcome
    Terminating(RunOutcome),
}

/// Counter owner and progress renderer for one category run
pub struct ProgressController {
    category: String,
    scheduled: usize,
    state: ControllerState,
    counters: RunCounters,
    failures: Vec<FailureRecord>,
    bar: ProgressBar,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl ProgressController {
    /// Create a controller for `scheduled` jobs of `category`
    ///
    /// When `show_progress` is false the bar is hidden but still tracks
    /// position.
    pub fn new(category: &Category, scheduled: usize, show_progress: bool, tick: Duration) -> Self {
        let bar = if show_progress {
            let bar = ProgressBar::new(scheduled as u64);
            match bar_style() {
                Ok(style) => bar.set_style(style),
                Err(e) => warn!("{}", e),
            }
            bar.set_prefix(category.name.clone());
            bar.enable_steady_tick(tick);
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            category: category.name.clone(),
            scheduled,
            state: ControllerState::Running,
            counters: RunCounters::for_rules(&category.rules),
            failures: Vec::new(),
            bar,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ControllerState::Running
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    /// Apply the outcome of a fully completed job
    pub fn record_success(&mut self, archive_name: &str, outcome: &JobOutcome) {
        self.counters.apply(outcome);
        self.bar.inc(1);
        self.bar.set_message(self.counters.summary_line());
        info!(
            "{}: {} done ({} of {})",
            self.category, archive_name, self.counters.archives_downloaded, self.scheduled
        );
    }

    /// Record a failed job; counters are left untouched
    pub fn record_failure(&mut self, err: &TransferError) {
        self.bar.inc(1);
        self.bar.suspend(|| error!("{}: {}", self.category, err));
        self.failures.push(FailureRecord::from(err));
    }

    /// Record a job task that ended without reporting a result
    pub fn record_lost_task(&mut self, message: String) {
        self.bar.inc(1);
        error!("{}: job task ended abnormally: {}", self.category, message);
        self.failures.push(FailureRecord {
            url: "unknown".to_string(),
            stage: None,
            message,
        });
    }

    /// Stop dispatching; the first cause wins
    pub fn terminate(&mut self, cause: RunOutcome) {
        if self.is_running() {
            match cause {
                RunOutcome::Cancelled => warn!("{}: cancellation requested", self.category),
                RunOutcome::Failed => warn!("{}: stopping after failure", self.category),
                RunOutcome::Completed => {}
            }
            self.state = ControllerState::Terminating(cause);
        }
    }

    /// Shared reporting routine for every exit path
    pub fn finish(self, category: &Category) -> CategoryReport {
        let outcome = match self.state {
            ControllerState::Running => RunOutcome::Completed,
            ControllerState::Terminating(cause) => cause,
        };

        match outcome {
            RunOutcome::Completed => self.bar.finish_with_message(self.counters.summary_line()),
            _ => self.bar.abandon_with_message(self.counters.summary_line()),
        }

        let report = CategoryReport {
            category: self.category,
            outcome,
            scheduled: self.scheduled,
            counters: self.counters,
            census: census(category),
            failures: self.failures,
            started_at: self.started_at,
            duration: self.started.elapsed(),
        };

        info!(
            "{} {}: {} archives processed, {} failures",
            report.category,
            report.outcome,
            report.counters.archives_downloaded,
            report.failures.len()
        );
        report
    }
}

fn bar_style() -> Result<ProgressStyle, ProgressError> {
    ProgressStyle::default_bar()
        .template(progress::BAR_TEMPLATE)
        .map(|style| style.progress_chars("=>-"))
        .map_err(|e| ProgressError::Template {
            reason: e.to_string(),
        })
}
