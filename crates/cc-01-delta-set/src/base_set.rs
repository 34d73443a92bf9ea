//! # Base Set
//!
//! The committed side of a versioned container: an ordered baseline snapshot
//! behind an `Arc`, plus the gate enforcing a single outstanding delta.
//!
//! Readers take [`SetSnapshot`]s, which are cheap `Arc` clones of the
//! baseline and remain stable across commits on the owning set. The writer
//! opens a [`SetDelta`](crate::SetDelta), mutates it, and either commits it
//! back (the baseline is replaced atomically) or drops it (rollback).

use crate::delta::{DeltaGate, SetDelta};
use crate::errors::DeltaError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A versioned, ordered container with copy-on-write commit semantics.
#[derive(Debug)]
pub struct BaseSet<K, V> {
    /// Committed baseline, replaced wholesale at commit.
    baseline: Arc<BTreeMap<K, V>>,
    /// Set while a delta is outstanding.
    delta_gate: Arc<AtomicBool>,
    /// Number of commits applied to this set.
    commit_count: u64,
}

impl<K: Ord + Clone, V: Clone> BaseSet<K, V> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            baseline: Arc::new(BTreeMap::new()),
            delta_gate: Arc::new(AtomicBool::new(false)),
            commit_count: 0,
        }
    }

    /// Creates a set seeded with `entries` as its first baseline.
    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            baseline: Arc::new(entries.into_iter().collect()),
            delta_gate: Arc::new(AtomicBool::new(false)),
            commit_count: 0,
        }
    }

    /// Opens a delta on top of the current baseline.
    ///
    /// # Errors
    ///
    /// `DeltaError::ConcurrencyViolation` if a delta is already outstanding.
    /// This is a programming error in the caller, not a retryable condition.
    pub fn create_delta(&self) -> Result<SetDelta<K, V>, DeltaError> {
        if self
            .delta_gate
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DeltaError::ConcurrencyViolation);
        }

        Ok(SetDelta::new(
            self.baseline.clone(),
            DeltaGate::new(self.delta_gate.clone()),
        ))
    }

    /// Commits `delta`, replacing the baseline with its effective state.
    ///
    /// The swap is atomic with respect to readers: snapshots taken before the
    /// commit keep observing the previous baseline.
    ///
    /// # Errors
    ///
    /// `DeltaError::ForeignDelta` if `delta` was not created from this set;
    /// the delta is discarded in that case.
    pub fn commit(&mut self, delta: SetDelta<K, V>) -> Result<(), DeltaError> {
        if !delta.gate().shares_flag(&self.delta_gate) {
            return Err(DeltaError::ForeignDelta);
        }

        let stats = delta.stats();
        self.baseline = Arc::new(delta.fold_into_baseline());
        self.commit_count += 1;
        debug!(
            added = stats.added,
            removed = stats.removed,
            copied = stats.copied,
            commit_count = self.commit_count,
            "Delta committed"
        );
        Ok(())
    }

    /// Discards `delta`; the baseline is untouched.
    ///
    /// Equivalent to dropping the delta, made explicit for call sites that
    /// want the rollback to be visible.
    pub fn rollback(&self, delta: SetDelta<K, V>) {
        let stats = delta.stats();
        debug!(
            added = stats.added,
            removed = stats.removed,
            copied = stats.copied,
            "Delta rolled back"
        );
        drop(delta);
    }

    /// Takes a stable snapshot of the committed baseline.
    pub fn snapshot(&self) -> SetSnapshot<K, V> {
        SetSnapshot {
            entries: self.baseline.clone(),
        }
    }

    /// True if a delta is currently outstanding.
    pub fn has_outstanding_delta(&self) -> bool {
        self.delta_gate.load(Ordering::Acquire)
    }

    /// Number of commits applied to this set.
    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }

    /// Number of committed elements.
    pub fn len(&self) -> usize {
        self.baseline.len()
    }

    /// True if the committed baseline is empty.
    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
    }
}

impl<K: Ord + Clone, V: Clone> Default for BaseSet<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A stable, read-only snapshot of a committed baseline.
///
/// Snapshots are cheap to clone and safe to read from any thread; they are
/// never affected by deltas opened or committed after they were taken.
#[derive(Debug, Clone)]
pub struct SetSnapshot<K, V> {
    entries: Arc<BTreeMap<K, V>>,
}

impl<K: Ord, V> SetSnapshot<K, V> {
    /// Looks up `key` in the snapshot.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// True if the snapshot holds `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of elements in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the snapshot in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }
}
