//! # Set Delta
//!
//! The mutable, writer-exclusive overlay representing an in-progress
//! transaction on a [`BaseSet`](crate::BaseSet).
//!
//! ## Overlay Model
//!
//! Mutations are tracked in three maps over the borrowed baseline snapshot:
//!
//! - `added`: keys absent from the baseline that were inserted
//! - `removed`: baseline keys marked for removal
//! - `copied`: baseline values duplicated into the delta for in-place
//!   mutation (the baseline copy stays visible to concurrent readers)
//!
//! The effective state of the delta is `copied ∪ (baseline ∖ removed ∖
//! copied) ∪ added`, and `commit` folds exactly that into the next baseline.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of an insert into a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// A new element was inserted.
    Inserted,
    /// An existing element was updated.
    Updated,
    /// An element pending removal was reverted.
    Unremoved,
}

/// Result of a remove from a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveResult {
    /// An existing baseline element was removed.
    Removed,
    /// An element pending insert was reverted; it never reaches the baseline.
    Uninserted,
    /// An element pending modification was reverted and removed.
    UnmodifiedAndRemoved,
    /// The element was already removed.
    Redundant,
    /// No matching element was found.
    NotFound,
}

/// Per-key mutation status relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationTag {
    /// Present in the baseline, untouched by this delta.
    Unmodified,
    /// Baseline value duplicated into the delta for mutation.
    Copied,
    /// Inserted by this delta; absent from the baseline.
    Inserted,
    /// Baseline element marked for removal.
    Removed,
}

/// Counts of pending mutations, for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeltaStats {
    /// Elements pending insert.
    pub added: usize,
    /// Elements pending removal.
    pub removed: usize,
    /// Elements copied for mutation.
    pub copied: usize,
}

impl DeltaStats {
    /// True if the delta carries no pending mutations.
    pub fn is_clean(&self) -> bool {
        0 == self.added + self.removed + self.copied
    }
}

/// Releases the single-delta gate of the owning container on drop.
///
/// Dropping the guard without a commit is the rollback path: the baseline is
/// untouched and the container accepts the next `create_delta`.
#[derive(Debug)]
pub(crate) struct DeltaGate {
    flag: Arc<AtomicBool>,
}

impl DeltaGate {
    pub(crate) fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    pub(crate) fn shares_flag(&self, other: &Arc<AtomicBool>) -> bool {
        Arc::ptr_eq(&self.flag, other)
    }
}

impl Drop for DeltaGate {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A transactional overlay on a [`BaseSet`](crate::BaseSet).
///
/// Not thread safe; owned by the single writer that opened it.
#[derive(Debug)]
pub struct SetDelta<K, V> {
    baseline: Arc<BTreeMap<K, V>>,
    added: BTreeMap<K, V>,
    removed: BTreeSet<K>,
    copied: BTreeMap<K, V>,
    gate: DeltaGate,
}

impl<K: Ord + Clone, V: Clone> SetDelta<K, V> {
    pub(crate) fn new(baseline: Arc<BTreeMap<K, V>>, gate: DeltaGate) -> Self {
        Self {
            baseline,
            added: BTreeMap::new(),
            removed: BTreeSet::new(),
            copied: BTreeMap::new(),
            gate,
        }
    }

    pub(crate) fn gate(&self) -> &DeltaGate {
        &self.gate
    }

    /// Number of elements in the effective state.
    pub fn len(&self) -> usize {
        self.baseline.len() - self.removed.len() + self.added.len()
    }

    /// True if the effective state holds no elements.
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Counts of pending mutations.
    pub fn stats(&self) -> DeltaStats {
        DeltaStats {
            added: self.added.len(),
            removed: self.removed.len(),
            copied: self.copied.len(),
        }
    }

    /// Inserts `value` under `key`.
    ///
    /// Re-inserting a key pending removal reverts the removal; inserting over
    /// a baseline key duplicates it into the overlay. Idempotent per key.
    pub fn insert(&mut self, key: K, value: V) -> InsertResult {
        if self.removed.remove(&key) {
            // the key is an original element; keep the (possibly modified)
            // value in the copied overlay
            self.copied.insert(key, value);
            return InsertResult::Unremoved;
        }

        if self.baseline.contains_key(&key) || self.copied.contains_key(&key) {
            self.copied.insert(key, value);
            return InsertResult::Updated;
        }

        match self.added.insert(key, value) {
            Some(_) => InsertResult::Updated,
            None => InsertResult::Inserted,
        }
    }

    /// Removes the element identified by `key`.
    ///
    /// Removing an element inserted by this same delta discards it entirely.
    pub fn remove(&mut self, key: &K) -> RemoveResult {
        if self.removed.contains(key) {
            return RemoveResult::Redundant;
        }

        if self.copied.remove(key).is_some() {
            self.removed.insert(key.clone());
            return RemoveResult::UnmodifiedAndRemoved;
        }

        if self.added.remove(key).is_some() {
            return RemoveResult::Uninserted;
        }

        if self.baseline.contains_key(key) {
            self.removed.insert(key.clone());
            return RemoveResult::Removed;
        }

        RemoveResult::NotFound
    }

    /// Resolves `key` against delta-local state first, then the baseline.
    ///
    /// Removed-but-uncommitted entries are never exposed.
    pub fn get(&self, key: &K) -> Option<&V> {
        if self.removed.contains(key) {
            return None;
        }

        self.copied
            .get(key)
            .or_else(|| self.added.get(key))
            .or_else(|| self.baseline.get(key))
    }

    /// Mutable access with copy-on-write semantics.
    ///
    /// A baseline element is duplicated into the overlay on first mutable
    /// access; the baseline copy stays visible to concurrent readers.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.removed.contains(key) {
            return None;
        }

        if self.copied.contains_key(key) {
            return self.copied.get_mut(key);
        }

        if self.added.contains_key(key) {
            return self.added.get_mut(key);
        }

        let original = self.baseline.get(key)?;
        self.copied.insert(key.clone(), original.clone());
        self.copied.get_mut(key)
    }

    /// True if `key` resolves to an element in the effective state.
    pub fn contains(&self, key: &K) -> bool {
        !self.removed.contains(key)
            && (self.copied.contains_key(key)
                || self.added.contains_key(key)
                || self.baseline.contains_key(key))
    }

    /// Mutation status of `key`, if it is known to this delta or baseline.
    pub fn mutation(&self, key: &K) -> Option<MutationTag> {
        if self.removed.contains(key) {
            return Some(MutationTag::Removed);
        }
        if self.copied.contains_key(key) {
            return Some(MutationTag::Copied);
        }
        if self.added.contains_key(key) {
            return Some(MutationTag::Inserted);
        }
        if self.baseline.contains_key(key) {
            return Some(MutationTag::Unmodified);
        }
        None
    }

    /// Iterates the effective state: copied elements, then surviving
    /// originals, then added elements.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.copied
            .iter()
            .chain(
                self.baseline
                    .iter()
                    .filter(|(k, _)| !self.removed.contains(*k) && !self.copied.contains_key(*k)),
            )
            .chain(self.added.iter())
    }

    /// Folds the pending mutations over the baseline into the next one.
    pub(crate) fn fold_into_baseline(mut self) -> BTreeMap<K, V> {
        let mut next = (*self.baseline).clone();
        for key in std::mem::take(&mut self.removed) {
            next.remove(&key);
        }
        next.extend(std::mem::take(&mut self.copied));
        next.extend(std::mem::take(&mut self.added));
        next
    }
}
