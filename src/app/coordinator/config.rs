//! Configuration structures for the sync coordinator
//!
//! Deserialized from the `[pipeline]` section of the configuration file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{progress, workers};
use crate::errors::{ConfigError, ConfigResult};

/// What happens to the rest of a category when one archive job fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop dispatching, abandon in-flight jobs and report
    #[default]
    Abort,
    /// Record the failure and keep processing the remaining jobs
    Continue,
}

/// Configuration for the sync coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Number of archive jobs processed concurrently
    pub worker_count: usize,
    /// Behaviour after a failed job
    pub failure_policy: FailurePolicy,
    /// How often the progress bar redraws
    #[serde(with = "humantime_serde")]
    pub progress_update_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            failure_policy: FailurePolicy::default(),
            progress_update_interval: progress::TICK_INTERVAL,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set progress update interval
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_update_interval = interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.worker_count == 0 {
            errors.push("pipeline.worker_count must be at least 1".to_string());
        }
        if self.worker_count > workers::MAX_WORKER_COUNT {
            errors.push(format!(
                "pipeline.worker_count must not exceed {}",
                workers::MAX_WORKER_COUNT
            ));
        }
        if self.progress_update_interval.is_zero() {
            errors.push("pipeline.progress_update_interval cannot be zero".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }
}
