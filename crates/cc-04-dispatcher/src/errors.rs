use thiserror::Error;

/// Errors surfaced to producers submitting work to a dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatcherError {
    /// The queue is at capacity under the `ReturnError` policy.
    ///
    /// Recoverable: the producer may retry after backoff.
    #[error("dispatcher {name} at capacity {capacity}; element rejected")]
    AdmissionRejected { name: String, capacity: usize },

    /// The queue is at capacity under the `FailFast` policy.
    ///
    /// A hard failure; not retried internally.
    #[error("dispatcher {name} at capacity {capacity}; failing fast")]
    AdmissionFatal { name: String, capacity: usize },

    /// The dispatcher is shutting down; no new elements are admitted.
    #[error("dispatcher {name} is shut down")]
    Shutdown { name: String },

    /// The verdict channel closed before delivery.
    #[error("verdict channel closed before delivery")]
    VerdictChannelClosed,
}
