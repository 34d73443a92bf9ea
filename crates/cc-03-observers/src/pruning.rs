//! # History Pruning Observer
//!
//! Evicts expired history records on a height cadence.
//!
//! ## Deliberate Asymmetry
//!
//! Unlike every other observer, pruning is **not** self-inverse: records
//! evicted in Commit mode are gone, and replaying the notification in
//! Rollback mode restores nothing. This is safe only while the retention
//! window of every history cache exceeds the maximum reorg depth the node
//! accepts; a rollback can then never need a pruned record. The runtime
//! configuration enforces that relationship.

use crate::context::{NotifyMode, ObserverContext};
use crate::errors::ObserverError;
use crate::notifications::Notification;
use crate::observer::Observer;
use tracing::debug;

/// Prunes history caches every `prune_interval` blocks.
///
/// Unconditional on notification content: it reacts to the terminal
/// [`Notification::BlockClosed`] and only consults the height.
pub struct HistoryPruningObserver {
    prune_interval: u64,
}

impl HistoryPruningObserver {
    /// Creates an observer pruning every `prune_interval` blocks.
    ///
    /// An interval of zero disables pruning.
    pub fn new(prune_interval: u64) -> Self {
        Self { prune_interval }
    }
}

impl Observer for HistoryPruningObserver {
    fn name(&self) -> &str {
        "history_pruning"
    }

    fn notify(
        &self,
        notification: &Notification,
        context: &mut ObserverContext<'_>,
    ) -> Result<(), ObserverError> {
        let Notification::BlockClosed { height, .. } = notification else {
            return Ok(());
        };

        // pruning never runs on the rollback path
        if NotifyMode::Rollback == context.mode {
            return Ok(());
        }

        if 0 == self.prune_interval || 0 != height % self.prune_interval {
            return Ok(());
        }

        let evicted = context.delta.prune(*height);
        debug!(height, evicted, "History caches pruned");
        Ok(())
    }
}
