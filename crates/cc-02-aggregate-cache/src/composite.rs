//! # Composite Cache
//!
//! The ordered collection of sub-caches presented as one atomic
//! transactional unit. Membership is fixed at build time; a composite delta
//! opens a delta on every member, and commit/rollback covers all of them.
//!
//! ## Invariants
//!
//! - Membership never changes after `build()`.
//! - `create_delta` is all-or-nothing: if any member has an outstanding
//!   delta, no member keeps a new one.
//! - A member failing to commit after siblings committed is fatal
//!   ([`CacheError::PartialCommit`]); there is no recovery path.

use crate::errors::{CacheError, StorageError};
use crate::storage::{CacheCheckpoint, CacheStorage};
use crate::sub_cache::{downcast_delta, downcast_view, SubCache, SubCacheDelta, SubCacheView};
use crate::summary::CacheSummary;
use shared_types::Height;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// One registered member: the cache plus its checkpoint storage policy.
struct SubCacheSlot {
    cache: Arc<dyn SubCache>,
    storage: Arc<dyn CacheStorage>,
}

/// Builder fixing the composite membership before first use.
#[derive(Default)]
pub struct CompositeCacheBuilder {
    slots: Vec<SubCacheSlot>,
    index: HashMap<&'static str, usize>,
}

impl CompositeCacheBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `cache` with its checkpoint `storage` policy.
    ///
    /// # Errors
    ///
    /// `CacheError::DuplicateSubCache` if the name is already registered.
    pub fn add_sub_cache(
        &mut self,
        cache: Arc<dyn SubCache>,
        storage: Arc<dyn CacheStorage>,
    ) -> Result<&mut Self, CacheError> {
        let name = cache.name();
        if self.index.contains_key(name) {
            return Err(CacheError::DuplicateSubCache {
                name: name.to_string(),
            });
        }

        self.index.insert(name, self.slots.len());
        self.slots.push(SubCacheSlot { cache, storage });
        Ok(self)
    }

    /// Seals the membership and produces the composite cache.
    pub fn build(self) -> CompositeCache {
        debug!(sub_caches = self.slots.len(), "Composite cache built");
        CompositeCache {
            slots: self.slots,
            index: self.index,
            height: AtomicU64::new(0),
        }
    }
}

/// The process-wide aggregate of all sub-caches.
pub struct CompositeCache {
    slots: Vec<SubCacheSlot>,
    index: HashMap<&'static str, usize>,
    /// Height of the last committed block.
    height: AtomicU64,
}

impl CompositeCache {
    /// Opens a delta on every member atomically.
    ///
    /// # Errors
    ///
    /// `CacheError::Delta(ConcurrencyViolation)` if any member already has an
    /// outstanding delta; members opened before the failure are released.
    pub fn create_delta(&self) -> Result<CompositeDelta, CacheError> {
        let mut deltas = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            // on error, the deltas vector drops and releases earlier members
            deltas.push(slot.cache.create_delta()?);
        }

        Ok(CompositeDelta {
            deltas,
            index: self.index.clone(),
        })
    }

    /// Takes a read-only snapshot of every member.
    ///
    /// Views never block the writer and are never blocked by it.
    pub fn create_view(&self) -> CompositeView {
        CompositeView {
            views: self
                .slots
                .iter()
                .map(|slot| (slot.cache.name(), slot.cache.create_view()))
                .collect(),
            index: self.index.clone(),
            height: self.height.load(Ordering::Acquire),
        }
    }

    /// Commits `delta` into every member and advances the cache height.
    ///
    /// # Errors
    ///
    /// `CacheError::PartialCommit` if a member fails after siblings
    /// committed. The composite state must then be considered corrupt; the
    /// caller is expected to terminate the process.
    pub fn commit(&self, delta: CompositeDelta, height: Height) -> Result<(), CacheError> {
        let mut committed = 0usize;
        for (slot, member) in self.slots.iter().zip(delta.deltas) {
            if let Err(source) = slot.cache.commit(member) {
                error!(
                    cache = slot.cache.name(),
                    committed,
                    %source,
                    "Sub-cache commit failed mid-composite; state is corrupt"
                );
                return Err(CacheError::PartialCommit {
                    name: slot.cache.name().to_string(),
                });
            }
            committed += 1;
        }

        self.height.store(height, Ordering::Release);
        debug!(height, "Composite cache committed");
        Ok(())
    }

    /// Discards `delta`; every member baseline is untouched.
    pub fn rollback(&self, delta: CompositeDelta) {
        debug!("Composite delta rolled back");
        drop(delta);
    }

    /// Height of the last committed block.
    pub fn height(&self) -> Height {
        self.height.load(Ordering::Acquire)
    }

    /// Number of registered members.
    pub fn sub_cache_count(&self) -> usize {
        self.slots.len()
    }

    /// Serializes every member through its storage policy.
    ///
    /// # Errors
    ///
    /// `StorageError` from the first failing policy; the checkpoint is then
    /// considered not completed.
    pub fn save_checkpoint(&self) -> Result<Vec<CacheCheckpoint>, StorageError> {
        let view = self.create_view();
        let mut checkpoints = Vec::with_capacity(self.slots.len());
        for (slot, (_, member)) in self.slots.iter().zip(view.views.iter()) {
            let mut bytes = Vec::new();
            slot.storage.save(member.as_ref(), &mut bytes)?;
            checkpoints.push(CacheCheckpoint {
                name: slot.cache.name().to_string(),
                summary: member.summarize(),
                bytes,
            });
        }
        Ok(checkpoints)
    }

    /// Loads `checkpoints` into a fresh delta and commits them at `height`.
    ///
    /// # Errors
    ///
    /// `StorageError::UnknownSubCache` for a checkpoint naming an
    /// unregistered member; decode failures surface as
    /// `StorageError::Serialization`.
    pub fn restore_checkpoint(
        &self,
        checkpoints: &[CacheCheckpoint],
        height: Height,
    ) -> Result<(), StorageError> {
        let mut delta = self
            .create_delta()
            .map_err(|error| StorageError::Cache(error.to_string()))?;

        for checkpoint in checkpoints {
            let position =
                self.index
                    .get(checkpoint.name.as_str())
                    .ok_or_else(|| StorageError::UnknownSubCache {
                        name: checkpoint.name.clone(),
                    })?;
            let slot = &self.slots[*position];
            slot.storage
                .load_into(&mut checkpoint.bytes.as_slice(), delta.raw_delta_mut(*position))?;
        }

        self.commit(delta, height)
            .map_err(|error| StorageError::Cache(error.to_string()))
    }
}

/// Writer-exclusive transactional handle across every sub-cache.
pub struct CompositeDelta {
    deltas: Vec<Box<dyn SubCacheDelta>>,
    index: HashMap<&'static str, usize>,
}

impl CompositeDelta {
    /// Typed access to the delta of the sub-cache registered under `name`.
    pub fn sub_cache<T: 'static>(&self, name: &str) -> Result<&T, CacheError> {
        let position = self.position(name)?;
        self.deltas[position]
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| CacheError::TypeMismatch {
                name: name.to_string(),
            })
    }

    /// Typed mutable access to the delta registered under `name`.
    pub fn sub_cache_mut<T: 'static>(&mut self, name: &str) -> Result<&mut T, CacheError> {
        let position = self.position(name)?;
        downcast_delta(name, self.deltas[position].as_mut())
    }

    /// Applies every member's prune policy at `height`.
    ///
    /// Returns the total number of evicted records.
    pub fn prune(&mut self, height: Height) -> usize {
        self.deltas
            .iter_mut()
            .map(|delta| delta.prune(height))
            .sum()
    }

    fn position(&self, name: &str) -> Result<usize, CacheError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CacheError::UnknownSubCache {
                name: name.to_string(),
            })
    }

    fn raw_delta_mut(&mut self, position: usize) -> &mut dyn SubCacheDelta {
        self.deltas[position].as_mut()
    }
}

/// Read-only snapshot across every sub-cache.
pub struct CompositeView {
    views: Vec<(&'static str, Box<dyn SubCacheView>)>,
    index: HashMap<&'static str, usize>,
    height: Height,
}

impl CompositeView {
    /// Typed access to the view of the sub-cache registered under `name`.
    pub fn sub_cache<T: 'static>(&self, name: &str) -> Result<&T, CacheError> {
        let position = self
            .index
            .get(name)
            .copied()
            .ok_or_else(|| CacheError::UnknownSubCache {
                name: name.to_string(),
            })?;
        downcast_view(name, self.views[position].1.as_ref())
    }

    /// Height of the last committed block at snapshot time.
    pub fn height(&self) -> Height {
        self.height
    }

    /// Summary projections of every member, in registration order.
    pub fn summaries(&self) -> Vec<(&'static str, CacheSummary)> {
        self.views
            .iter()
            .map(|(name, view)| (*name, view.summarize()))
            .collect()
    }

}
