//! # Node Configuration

use cc_04_dispatcher::{FullQueuePolicy, DEFAULT_CAPACITY, DEFAULT_TRACE_INTERVAL};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The retention window is too small for the prune cadence.
    ///
    /// Pruning is not undone on rollback, so the retention window must at
    /// least cover one prune interval; otherwise a reorg inside a single
    /// prune window could need history that is already gone.
    #[error("statistic retention {retention} must be >= prune interval {prune_interval}")]
    RetentionTooSmall { retention: u64, prune_interval: u64 },

    /// An environment variable held an unparsable value.
    #[error("invalid value for {variable}: {value}")]
    InvalidEnvValue { variable: String, value: String },
}

/// Runtime configuration of the node core.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Dispatcher queue capacity (in-flight plus queued).
    pub dispatcher_capacity: usize,
    /// Dispatcher behavior at capacity.
    pub full_queue_policy: FullQueuePolicy,
    /// Dispatcher trace sampling interval.
    pub trace_interval: u64,
    /// Blocks between pruning observer activations.
    pub prune_interval: u64,
    /// Heights of block statistics kept behind the tip.
    pub statistic_retention: u64,
    /// Delay before the first tick of every scheduled task.
    pub task_start_delay: Duration,
    /// Interval of the dispatcher-routed pruning task.
    pub prune_task_interval: Duration,
    /// Interval of the checkpoint task.
    pub checkpoint_interval: Duration,
    /// Interval of the chain height polling task.
    pub height_poll_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            dispatcher_capacity: DEFAULT_CAPACITY,
            full_queue_policy: FullQueuePolicy::ReturnError,
            trace_interval: DEFAULT_TRACE_INTERVAL,
            prune_interval: 360,
            statistic_retention: 1440,
            task_start_delay: Duration::from_secs(1),
            prune_task_interval: Duration::from_secs(60),
            checkpoint_interval: Duration::from_secs(300),
            height_poll_interval: Duration::from_secs(5),
        }
    }
}

impl NodeConfig {
    /// Builds the configuration from environment variables, falling back to
    /// defaults.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CASCADE_DISPATCHER_CAPACITY` | `1024` | Queue capacity |
    /// | `CASCADE_FAIL_FAST` | `false` | FailFast instead of ReturnError |
    /// | `CASCADE_PRUNE_INTERVAL` | `360` | Blocks between prunes |
    /// | `CASCADE_STATISTIC_RETENTION` | `1440` | Statistic history window |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("CASCADE_DISPATCHER_CAPACITY") {
            config.dispatcher_capacity =
                value.parse().map_err(|_| ConfigError::InvalidEnvValue {
                    variable: "CASCADE_DISPATCHER_CAPACITY".into(),
                    value: value.clone(),
                })?;
        }
        if let Ok(value) = std::env::var("CASCADE_FAIL_FAST") {
            if "1" == value || "true" == value.to_lowercase() {
                config.full_queue_policy = FullQueuePolicy::FailFast;
            }
        }
        if let Ok(value) = std::env::var("CASCADE_PRUNE_INTERVAL") {
            config.prune_interval = value.parse().map_err(|_| ConfigError::InvalidEnvValue {
                variable: "CASCADE_PRUNE_INTERVAL".into(),
                value: value.clone(),
            })?;
        }
        if let Ok(value) = std::env::var("CASCADE_STATISTIC_RETENTION") {
            config.statistic_retention =
                value.parse().map_err(|_| ConfigError::InvalidEnvValue {
                    variable: "CASCADE_STATISTIC_RETENTION".into(),
                    value: value.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.statistic_retention < self.prune_interval {
            return Err(ConfigError::RetentionTooSmall {
                retention: self.statistic_retention,
                prune_interval: self.prune_interval,
            });
        }
        Ok(())
    }
}
