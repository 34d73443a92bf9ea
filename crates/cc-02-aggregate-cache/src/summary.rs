//! # Cache Summary
//!
//! The summary projection computed per sub-cache at checkpoint boundaries:
//! a record count plus a Keccak-256 digest over the ordered serialized
//! entries. Two caches with the same summary hold the same committed state.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_types::Hash;

/// Summary projection of one sub-cache's committed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSummary {
    /// Number of committed records.
    pub entries: usize,
    /// Keccak-256 digest over the ordered serialized records.
    pub state_hash: Hash,
}

impl CacheSummary {
    /// Computes a summary over ordered `(key, value)` records.
    ///
    /// Iteration order must be deterministic; the delta-set baselines are
    /// ordered containers, which is what makes this digest stable.
    pub fn compute<'a, K, V, I>(records: I) -> Self
    where
        K: Serialize + 'a,
        V: Serialize + 'a,
        I: Iterator<Item = (&'a K, &'a V)>,
    {
        let mut hasher = Keccak256::new();
        let mut entries = 0usize;
        for (key, value) in records {
            hasher.update(bincode::serialize(key).unwrap_or_default());
            hasher.update(bincode::serialize(value).unwrap_or_default());
            entries += 1;
        }

        Self {
            entries,
            state_hash: hasher.finalize().into(),
        }
    }

    /// Summary of an empty cache.
    pub fn empty() -> Self {
        Self::compute(std::iter::empty::<(&u8, &u8)>())
    }
}
