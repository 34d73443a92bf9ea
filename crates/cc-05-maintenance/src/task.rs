//! # Scheduled Task
//!
//! One named periodic callback with its start and repeat delays.

use crate::errors::TaskError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// What the scheduler should do after a callback ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    /// Run again after the repeat delay.
    Continue,
    /// Stop scheduling this task.
    Stop,
}

/// The periodic work of a scheduled task.
#[async_trait]
pub trait TaskCallback: Send + Sync {
    /// Runs one tick.
    async fn run(&self) -> Result<TaskResult, TaskError>;
}

/// Adapter wrapping an async closure as a [`TaskCallback`].
pub struct FunctionalTaskCallback<F> {
    callback: F,
}

impl<F, Fut> FunctionalTaskCallback<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<TaskResult, TaskError>> + Send,
{
    /// Wraps `callback`.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F, Fut> TaskCallback for FunctionalTaskCallback<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<TaskResult, TaskError>> + Send,
{
    async fn run(&self) -> Result<TaskResult, TaskError> {
        (self.callback)().await
    }
}

/// One named periodic task.
pub struct ScheduledTask {
    /// Task name, used in logs.
    pub name: String,
    /// Delay before the first tick.
    pub start_delay: Duration,
    /// Delay between ticks.
    pub repeat_delay: Duration,
    /// The periodic work.
    pub callback: Box<dyn TaskCallback>,
}

impl ScheduledTask {
    /// Creates a task.
    pub fn new(
        name: impl Into<String>,
        start_delay: Duration,
        repeat_delay: Duration,
        callback: Box<dyn TaskCallback>,
    ) -> Self {
        Self {
            name: name.into(),
            start_delay,
            repeat_delay,
            callback,
        }
    }
}
