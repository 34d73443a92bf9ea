//! # History Cache
//!
//! The generic history-keyed sub-cache: each key owns an ordered history of
//! records rather than a single value. Insert prepends to the history,
//! removal pops the most recent record, and pruning evicts records by
//! height according to the cache's [`PrunePolicy`].

use crate::errors::CacheError;
use crate::sub_cache::{SubCache, SubCacheDelta, SubCacheView};
use crate::summary::CacheSummary;
use cc_01_delta_set::{
    BaseSet, DeltaStats, HistoryEntry, RemoveResult, SetDelta, SetSnapshot, ValueHistory,
};
use parking_lot::RwLock;
use serde::Serialize;
use shared_types::Height;
use std::any::Any;
use tracing::debug;

/// Height-driven eviction policy of a history cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrunePolicy {
    /// Keep records attached within the last `window` heights; pruning at
    /// height `h` evicts records attached strictly below `h - window`.
    RetainWindow(u64),
    /// Records are attached at their expiry height; pruning at height `h`
    /// evicts records attached at or below `h`.
    ExpireAtOrBelow,
}

impl PrunePolicy {
    /// The exclusive lower bound of records surviving a prune at `height`.
    fn survival_floor(&self, height: Height) -> Height {
        match self {
            Self::RetainWindow(window) => height.saturating_sub(*window),
            Self::ExpireAtOrBelow => height.saturating_add(1),
        }
    }
}

/// A named sub-cache holding an ordered history of records per key.
pub struct HistoryCache<K, V> {
    name: &'static str,
    policy: PrunePolicy,
    inner: RwLock<BaseSet<K, ValueHistory<V>>>,
}

impl<K, V> HistoryCache<K, V>
where
    K: Ord + Clone + Send + Sync + Serialize + 'static,
    V: Clone + Send + Sync + Serialize + 'static,
{
    /// Creates an empty history cache registered under `name`.
    pub fn new(name: &'static str, policy: PrunePolicy) -> Self {
        Self {
            name,
            policy,
            inner: RwLock::new(BaseSet::new()),
        }
    }

    /// Typed delta, for call sites that do not go through the composite.
    pub fn create_typed_delta(&self) -> Result<HistoryCacheDelta<K, V>, CacheError> {
        Ok(HistoryCacheDelta {
            name: self.name,
            policy: self.policy,
            delta: self.inner.read().create_delta()?,
        })
    }

    /// Typed view.
    pub fn create_typed_view(&self) -> HistoryCacheView<K, V> {
        HistoryCacheView {
            snapshot: self.inner.read().snapshot(),
        }
    }

    /// Commits a typed delta.
    pub fn commit_typed(&self, delta: HistoryCacheDelta<K, V>) -> Result<(), CacheError> {
        self.inner.write().commit(delta.delta)?;
        Ok(())
    }
}

impl<K, V> SubCache for HistoryCache<K, V>
where
    K: Ord + Clone + Send + Sync + Serialize + 'static,
    V: Clone + Send + Sync + Serialize + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn create_delta(&self) -> Result<Box<dyn SubCacheDelta>, CacheError> {
        Ok(Box::new(self.create_typed_delta()?))
    }

    fn create_view(&self) -> Box<dyn SubCacheView> {
        Box::new(self.create_typed_view())
    }

    fn commit(&self, delta: Box<dyn SubCacheDelta>) -> Result<(), CacheError> {
        let typed = delta
            .into_any()
            .downcast::<HistoryCacheDelta<K, V>>()
            .map_err(|_| CacheError::TypeMismatch {
                name: self.name.to_string(),
            })?;
        self.commit_typed(*typed)
    }
}

/// Transactional handle of a [`HistoryCache`].
pub struct HistoryCacheDelta<K, V> {
    name: &'static str,
    policy: PrunePolicy,
    delta: SetDelta<K, ValueHistory<V>>,
}

impl<K, V> HistoryCacheDelta<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Prepends a record to the history under `key`, creating it if absent.
    pub fn push(&mut self, key: K, height: Height, value: V) {
        match self.delta.get_mut(&key) {
            Some(history) => history.push(height, value),
            None => {
                self.delta.insert(key, ValueHistory::with_record(height, value));
            }
        }
    }

    /// Pops the most recent record under `key`.
    ///
    /// A history left empty by the pop is removed entirely.
    pub fn pop(&mut self, key: &K) -> Option<HistoryEntry<V>> {
        let (entry, now_empty) = {
            let history = self.delta.get_mut(key)?;
            let entry = history.pop();
            let now_empty = history.is_empty();
            (entry, now_empty)
        };
        if now_empty {
            self.delta.remove(key);
        }
        entry
    }

    /// The most recent record under `key`, if any.
    pub fn most_recent(&self, key: &K) -> Option<&V> {
        self.delta.get(key)?.most_recent()
    }

    /// Mutable access to the most recent record under `key`.
    pub fn most_recent_mut(&mut self, key: &K) -> Option<&mut V> {
        self.delta.get_mut(key)?.most_recent_mut()
    }

    /// True if `key` owns a non-empty history.
    pub fn contains(&self, key: &K) -> bool {
        self.delta.contains(key)
    }

    /// Number of keys with a history.
    pub fn len(&self) -> usize {
        self.delta.len()
    }

    /// True if no key owns a history.
    pub fn is_empty(&self) -> bool {
        self.delta.is_empty()
    }

    /// Installs a complete history under `key` (checkpoint restore).
    pub fn restore_history(&mut self, key: K, history: ValueHistory<V>) {
        if !history.is_empty() {
            self.delta.insert(key, history);
        }
    }

    /// Drops the complete history under `key` (checkpoint purge).
    pub fn discard_history(&mut self, key: &K) -> bool {
        RemoveResult::NotFound != self.delta.remove(key)
    }

    /// Applies the cache's prune policy at `height`.
    ///
    /// Returns the number of evicted records; emptied histories are removed.
    /// Pruning twice at the same height is a no-op the second time.
    pub fn prune_at(&mut self, height: Height) -> usize {
        let floor = self.policy.survival_floor(height);
        let keys: Vec<K> = self.delta.iter().map(|(key, _)| key.clone()).collect();

        let mut evicted = 0;
        for key in keys {
            let (dropped, now_empty) = match self.delta.get_mut(&key) {
                Some(history) => (history.prune_below(floor), history.is_empty()),
                None => continue,
            };
            evicted += dropped;
            if now_empty {
                self.delta.remove(&key);
            }
        }

        if evicted > 0 {
            debug!(cache = self.name, height, evicted, "History records pruned");
        }
        evicted
    }
}

impl<K, V> SubCacheDelta for HistoryCacheDelta<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn stats(&self) -> DeltaStats {
        self.delta.stats()
    }

    fn prune(&mut self, height: Height) -> usize {
        self.prune_at(height)
    }
}

/// Read-only snapshot of a [`HistoryCache`].
pub struct HistoryCacheView<K, V> {
    snapshot: SetSnapshot<K, ValueHistory<V>>,
}

impl<K, V> HistoryCacheView<K, V>
where
    K: Ord + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// The most recent record under `key`, if any.
    pub fn most_recent(&self, key: &K) -> Option<&V> {
        self.snapshot.get(key)?.most_recent()
    }

    /// The full history under `key`, if any.
    pub fn history(&self, key: &K) -> Option<&ValueHistory<V>> {
        self.snapshot.get(key)
    }

    /// True if the snapshot holds a history under `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.snapshot.contains(key)
    }

    /// Iterates all histories in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &ValueHistory<V>)> {
        self.snapshot.iter()
    }
}

impl<K, V> SubCacheView for HistoryCacheView<K, V>
where
    K: Ord + Clone + Send + Sync + Serialize + 'static,
    V: Clone + Send + Sync + Serialize + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn len(&self) -> usize {
        self.snapshot.len()
    }

    fn summarize(&self) -> CacheSummary {
        CacheSummary::compute(self.snapshot.iter())
    }
}
