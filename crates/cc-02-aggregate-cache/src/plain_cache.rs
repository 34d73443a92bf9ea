//! # Plain Cache
//!
//! The generic one-record-per-key sub-cache: a delta-set container plus the
//! object-safe adapter glue. Concrete cache kinds instantiate this with
//! their own key/value types and register it under a cache name.

use crate::errors::CacheError;
use crate::sub_cache::{SubCache, SubCacheDelta, SubCacheView};
use crate::summary::CacheSummary;
use cc_01_delta_set::{BaseSet, DeltaStats, InsertResult, RemoveResult, SetDelta, SetSnapshot};
use parking_lot::RwLock;
use serde::Serialize;
use std::any::Any;

/// A named sub-cache holding one record per key.
pub struct PlainCache<K, V> {
    name: &'static str,
    inner: RwLock<BaseSet<K, V>>,
}

impl<K, V> PlainCache<K, V>
where
    K: Ord + Clone + Send + Sync + Serialize + 'static,
    V: Clone + Send + Sync + Serialize + 'static,
{
    /// Creates an empty cache registered under `name`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RwLock::new(BaseSet::new()),
        }
    }

    /// Creates a cache seeded with `entries`.
    pub fn from_entries(name: &'static str, entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            name,
            inner: RwLock::new(BaseSet::from_entries(entries)),
        }
    }

    /// Typed delta, for call sites that do not go through the composite.
    pub fn create_typed_delta(&self) -> Result<PlainCacheDelta<K, V>, CacheError> {
        Ok(PlainCacheDelta {
            delta: self.inner.read().create_delta()?,
        })
    }

    /// Typed view.
    pub fn create_typed_view(&self) -> PlainCacheView<K, V> {
        PlainCacheView {
            snapshot: self.inner.read().snapshot(),
        }
    }

    /// Commits a typed delta.
    pub fn commit_typed(&self, delta: PlainCacheDelta<K, V>) -> Result<(), CacheError> {
        self.inner.write().commit(delta.delta)?;
        Ok(())
    }
}

impl<K, V> SubCache for PlainCache<K, V>
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
            .downcast::<PlainCacheDelta<K, V>>()
            .map_err(|_| CacheError::TypeMismatch {
                name: self.name.to_string(),
            })?;
        self.commit_typed(*typed)
    }
}

/// Transactional handle of a [`PlainCache`].
pub struct PlainCacheDelta<K, V> {
    delta: SetDelta<K, V>,
}

impl<K, V> PlainCacheDelta<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Resolves `key` against the delta, falling back to the baseline.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.delta.get(key)
    }

    /// Copy-on-write mutable access.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.delta.get_mut(key)
    }

    /// Inserts `value` under `key`.
    pub fn insert(&mut self, key: K, value: V) -> InsertResult {
        self.delta.insert(key, value)
    }

    /// Removes the record under `key`.
    pub fn remove(&mut self, key: &K) -> RemoveResult {
        self.delta.remove(key)
    }

    /// True if `key` resolves to a record.
    pub fn contains(&self, key: &K) -> bool {
        self.delta.contains(key)
    }

    /// Number of records in the effective state.
    pub fn len(&self) -> usize {
        self.delta.len()
    }

    /// True if the effective state is empty.
    pub fn is_empty(&self) -> bool {
        self.delta.is_empty()
    }

    /// Iterates the effective state.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.delta.iter()
    }
}

impl<K, V> SubCacheDelta for PlainCacheDelta<K, V>
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
}

/// Read-only snapshot of a [`PlainCache`].
pub struct PlainCacheView<K, V> {
    snapshot: SetSnapshot<K, V>,
}

impl<K, V> PlainCacheView<K, V>
where
    K: Ord + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Looks up `key` in the snapshot.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.snapshot.get(key)
    }

    /// True if the snapshot holds `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.snapshot.contains(key)
    }

    /// Iterates the snapshot in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.snapshot.iter()
    }
}

impl<K, V> SubCacheView for PlainCacheView<K, V>
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
