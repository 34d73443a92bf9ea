use cc_01_delta_set::DeltaError;
use shared_types::{Address, Amount};
use thiserror::Error;

/// Errors from the composite cache layer.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A sub-cache with the same name was already registered.
    #[error("sub-cache already registered: {name}")]
    DuplicateSubCache { name: String },

    /// No sub-cache is registered under the requested name.
    #[error("unknown sub-cache: {name}")]
    UnknownSubCache { name: String },

    /// A delta or view handle did not downcast to the requested cache type.
    #[error("sub-cache {name} handle has unexpected type")]
    TypeMismatch { name: String },

    /// A member sub-cache failed to commit after siblings already did.
    ///
    /// This is an unrecoverable invariant violation: the composite state
    /// must be considered corrupt and the process terminated.
    #[error("partial commit: sub-cache {name} failed after siblings committed")]
    PartialCommit { name: String },

    /// The requested account does not exist.
    #[error("account not found: {}", hex::encode(address))]
    AccountNotFound { address: Address },

    /// A debit exceeded the available balance.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    /// No lock is registered under the requested hash.
    #[error("hash lock not found: {}", hex::encode(hash))]
    LockNotFound { hash: shared_types::Hash },

    /// Versioned container error (double-open, foreign delta).
    #[error(transparent)]
    Delta(#[from] DeltaError),
}

/// Errors from the checkpoint storage policies.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A record failed to encode or decode.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The underlying writer or reader failed.
    #[error("checkpoint I/O failed")]
    Io(#[from] std::io::Error),

    /// A checkpoint referenced a sub-cache that is not registered.
    #[error("checkpoint references unknown sub-cache: {name}")]
    UnknownSubCache { name: String },

    /// The cache layer rejected a checkpoint operation.
    #[error("cache error during checkpoint: {0}")]
    Cache(String),
}

impl From<bincode::Error> for StorageError {
    fn from(error: bincode::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
