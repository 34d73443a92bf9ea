//! # Block Statistic Observer
//!
//! Records the closed block's statistic on commit and pops it on rollback.

use crate::context::{NotifyMode, ObserverContext};
use crate::errors::ObserverError;
use crate::notifications::Notification;
use crate::observer::Observer;
use cc_02_aggregate_cache::{BlockStatisticCacheDelta, BLOCK_STATISTIC_CACHE_NAME};
use shared_types::BlockStatistic;

/// Applies [`Notification::BlockClosed`] to the block statistic cache.
pub struct BlockStatisticObserver;

impl Observer for BlockStatisticObserver {
    fn name(&self) -> &str {
        "block_statistic"
    }

    fn notify(
        &self,
        notification: &Notification,
        context: &mut ObserverContext<'_>,
    ) -> Result<(), ObserverError> {
        let Notification::BlockClosed {
            height,
            timestamp,
            difficulty,
            ..
        } = notification
        else {
            return Ok(());
        };

        let statistics = context
            .delta
            .sub_cache_mut::<BlockStatisticCacheDelta>(BLOCK_STATISTIC_CACHE_NAME)?;

        match context.mode {
            NotifyMode::Commit => statistics.record_block(BlockStatistic {
                height: *height,
                timestamp: *timestamp,
                difficulty: *difficulty,
            }),
            NotifyMode::Rollback => {
                statistics.unrecord_block(*height);
            }
        }
        Ok(())
    }
}
