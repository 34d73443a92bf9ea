use thiserror::Error;

/// Errors from the versioned container layer.
///
/// Both variants indicate programming errors in the caller, not recoverable
/// runtime conditions: callers must treat them as fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeltaError {
    /// A second delta was opened while one is still outstanding.
    #[error("a delta is already outstanding on this container")]
    ConcurrencyViolation,

    /// A delta was committed to a container it was not created from.
    #[error("delta does not belong to this container")]
    ForeignDelta,
}
