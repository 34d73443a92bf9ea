//! # Cache Storage Policies
//!
//! The serialization surface invoked at checkpoint and recovery boundaries.
//! The composite cache calls `save`/`load_into`/`purge`; the record format
//! is a bincode length-prefixed stream, and anything beyond that (files,
//! database columns, replication) belongs to the collaborator holding the
//! checkpoint bytes.

use crate::errors::StorageError;
use crate::history_cache::{HistoryCacheDelta, HistoryCacheView};
use crate::plain_cache::{PlainCacheDelta, PlainCacheView};
use crate::sub_cache::{SubCacheDelta, SubCacheView};
use crate::summary::CacheSummary;
use cc_01_delta_set::ValueHistory;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};
use std::marker::PhantomData;

/// One serialized sub-cache plus its summary projection.
#[derive(Debug, Clone)]
pub struct CacheCheckpoint {
    /// Registration name of the serialized sub-cache.
    pub name: String,
    /// Summary of the state the bytes were produced from.
    pub summary: CacheSummary,
    /// Length-prefixed bincode record stream.
    pub bytes: Vec<u8>,
}

/// Serialization policy of one sub-cache.
pub trait CacheStorage: Send + Sync {
    /// Writes every committed record of `view` to `out`.
    fn save(&self, view: &dyn SubCacheView, out: &mut dyn Write) -> Result<(), StorageError>;

    /// Reads records from `input` and inserts them into `delta`.
    ///
    /// Returns the number of records loaded.
    fn load_into(
        &self,
        input: &mut dyn Read,
        delta: &mut dyn SubCacheDelta,
    ) -> Result<usize, StorageError>;

    /// Reads records from `input` and removes them from `delta`.
    ///
    /// Returns the number of records purged.
    fn purge(
        &self,
        input: &mut dyn Read,
        delta: &mut dyn SubCacheDelta,
    ) -> Result<usize, StorageError>;
}

fn type_mismatch(kind: &str) -> StorageError {
    StorageError::Cache(format!("storage policy bound to a different {kind} cache type"))
}

/// Bincode storage policy of a [`PlainCache`](crate::PlainCache).
pub struct PlainCacheStorage<K, V> {
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> PlainCacheStorage<K, V> {
    /// Creates the policy.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K, V> Default for PlainCacheStorage<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheStorage for PlainCacheStorage<K, V>
where
    K: Ord + Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    fn save(&self, view: &dyn SubCacheView, out: &mut dyn Write) -> Result<(), StorageError> {
        let typed = view
            .as_any()
            .downcast_ref::<PlainCacheView<K, V>>()
            .ok_or_else(|| type_mismatch("plain"))?;

        bincode::serialize_into(&mut *out, &(typed.len() as u64))?;
        for (key, value) in typed.iter() {
            bincode::serialize_into(&mut *out, &(key, value))?;
        }
        Ok(())
    }

    fn load_into(
        &self,
        input: &mut dyn Read,
        delta: &mut dyn SubCacheDelta,
    ) -> Result<usize, StorageError> {
        let typed = delta
            .as_any_mut()
            .downcast_mut::<PlainCacheDelta<K, V>>()
            .ok_or_else(|| type_mismatch("plain"))?;

        let count: u64 = bincode::deserialize_from(&mut *input)?;
        for _ in 0..count {
            let (key, value): (K, V) = bincode::deserialize_from(&mut *input)?;
            typed.insert(key, value);
        }
        Ok(count as usize)
    }

    fn purge(
        &self,
        input: &mut dyn Read,
        delta: &mut dyn SubCacheDelta,
    ) -> Result<usize, StorageError> {
        let typed = delta
            .as_any_mut()
            .downcast_mut::<PlainCacheDelta<K, V>>()
            .ok_or_else(|| type_mismatch("plain"))?;

        let count: u64 = bincode::deserialize_from(&mut *input)?;
        let mut purged = 0usize;
        for _ in 0..count {
            let (key, _value): (K, V) = bincode::deserialize_from(&mut *input)?;
            if typed.contains(&key) {
                typed.remove(&key);
                purged += 1;
            }
        }
        Ok(purged)
    }
}

/// Bincode storage policy of a [`HistoryCache`](crate::HistoryCache).
pub struct HistoryCacheStorage<K, V> {
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> HistoryCacheStorage<K, V> {
    /// Creates the policy.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K, V> Default for HistoryCacheStorage<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheStorage for HistoryCacheStorage<K, V>
where
    K: Ord + Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    fn save(&self, view: &dyn SubCacheView, out: &mut dyn Write) -> Result<(), StorageError> {
        let typed = view
            .as_any()
            .downcast_ref::<HistoryCacheView<K, V>>()
            .ok_or_else(|| type_mismatch("history"))?;

        bincode::serialize_into(&mut *out, &(typed.len() as u64))?;
        for (key, history) in typed.iter() {
            bincode::serialize_into(&mut *out, &(key, history))?;
        }
        Ok(())
    }

    fn load_into(
        &self,
        input: &mut dyn Read,
        delta: &mut dyn SubCacheDelta,
    ) -> Result<usize, StorageError> {
        let typed = delta
            .as_any_mut()
            .downcast_mut::<HistoryCacheDelta<K, V>>()
            .ok_or_else(|| type_mismatch("history"))?;

        let count: u64 = bincode::deserialize_from(&mut *input)?;
        for _ in 0..count {
            let (key, history): (K, ValueHistory<V>) = bincode::deserialize_from(&mut *input)?;
            typed.restore_history(key, history);
        }
        Ok(count as usize)
    }

    fn purge(
        &self,
        input: &mut dyn Read,
        delta: &mut dyn SubCacheDelta,
    ) -> Result<usize, StorageError> {
        let typed = delta
            .as_any_mut()
            .downcast_mut::<HistoryCacheDelta<K, V>>()
            .ok_or_else(|| type_mismatch("history"))?;

        let count: u64 = bincode::deserialize_from(&mut *input)?;
        let mut purged = 0usize;
        for _ in 0..count {
            let (key, _history): (K, ValueHistory<V>) = bincode::deserialize_from(&mut *input)?;
            if typed.discard_history(&key) {
                purged += 1;
            }
        }
        Ok(purged)
    }
}
