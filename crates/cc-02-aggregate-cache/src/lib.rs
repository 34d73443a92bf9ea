//! # Aggregate Cache - Composite Transactional State
//!
//! Presents an ordered collection of named sub-caches as one atomic
//! transactional unit: a composite delta opens a delta on every member,
//! and commit/rollback is all-or-nothing across all of them.
//!
//! ## Role in System
//!
//! - **Single Writer**: one composite delta may be outstanding at a time,
//!   enforced by the delta-set gates of the member containers.
//! - **Lock-Free Readers**: composite views hold baseline snapshots and are
//!   never blocked by (or blocking) the writer.
//! - **Checkpoints**: each sub-cache carries a storage policy used to save,
//!   restore, and purge its contents at checkpoint boundaries.
//!
//! ## Cache Kinds
//!
//! - [`PlainCache`]: one record per key (account state).
//! - [`HistoryCache`]: an ordered history of records per key with a
//!   height-driven prune policy (block statistics, hash locks).

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod account_state;
pub mod block_statistic;
pub mod composite;
pub mod errors;
pub mod hash_lock;
pub mod history_cache;
pub mod plain_cache;
pub mod storage;
pub mod sub_cache;
pub mod summary;

pub use account_state::{
    account_state_cache, account_state_cache_with, AccountStateCache, AccountStateCacheDelta,
    AccountStateCacheView, ACCOUNT_STATE_CACHE_NAME,
};
pub use block_statistic::{
    block_statistic_cache, BlockStatisticCache, BlockStatisticCacheDelta, BlockStatisticCacheView,
    BLOCK_STATISTIC_CACHE_NAME,
};
pub use composite::{CompositeCache, CompositeCacheBuilder, CompositeDelta, CompositeView};
pub use errors::{CacheError, StorageError};
pub use hash_lock::{
    hash_lock_cache, HashLockInfoCache, HashLockInfoCacheDelta, HashLockInfoCacheView,
    HASH_LOCK_CACHE_NAME,
};
pub use history_cache::{HistoryCache, HistoryCacheDelta, HistoryCacheView, PrunePolicy};
pub use plain_cache::{PlainCache, PlainCacheDelta, PlainCacheView};
pub use storage::{CacheCheckpoint, CacheStorage, HistoryCacheStorage, PlainCacheStorage};
pub use sub_cache::{SubCache, SubCacheDelta, SubCacheView};
pub use summary::CacheSummary;
