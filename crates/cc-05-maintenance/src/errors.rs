use cc_04_dispatcher::DispatcherError;
use thiserror::Error;

/// Errors from scheduled task callbacks.
///
/// Task failures are logged and retried on the next tick; they never
/// propagate past the scheduler loop.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The callback failed.
    #[error("task failed: {0}")]
    Failed(String),

    /// The dispatcher refused the task's work submission.
    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),
}
