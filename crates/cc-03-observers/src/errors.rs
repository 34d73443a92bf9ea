use cc_02_aggregate_cache::CacheError;
use thiserror::Error;

/// Errors from observer execution.
///
/// An observer failure aborts processing of the current element only; the
/// element's delta is rolled back and the composite cache is left exactly
/// as before the element was attempted.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// A cache operation rejected the mutation.
    #[error("cache operation failed: {0}")]
    Cache(#[from] CacheError),

    /// The observer rejected the notification outright.
    #[error("notification rejected: {0}")]
    Rejected(String),
}
