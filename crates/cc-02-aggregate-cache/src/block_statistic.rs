//! # Block Statistic Cache
//!
//! History cache of per-block chain statistics keyed by height, retained
//! for a bounded window behind the chain tip. Feeds difficulty adjustment
//! and is pruned by the height-driven maintenance observer.

use crate::history_cache::{HistoryCache, HistoryCacheDelta, HistoryCacheView, PrunePolicy};
use shared_types::{BlockStatistic, Height};

/// Registration name of the block statistic cache.
pub const BLOCK_STATISTIC_CACHE_NAME: &str = "block_statistic";

/// The block statistic sub-cache.
pub type BlockStatisticCache = HistoryCache<Height, BlockStatistic>;

/// Transactional handle of the block statistic cache.
pub type BlockStatisticCacheDelta = HistoryCacheDelta<Height, BlockStatistic>;

/// Read-only snapshot of the block statistic cache.
pub type BlockStatisticCacheView = HistoryCacheView<Height, BlockStatistic>;

/// Creates a block statistic cache retaining `history_size` heights.
pub fn block_statistic_cache(history_size: u64) -> BlockStatisticCache {
    HistoryCache::new(
        BLOCK_STATISTIC_CACHE_NAME,
        PrunePolicy::RetainWindow(history_size),
    )
}

impl HistoryCacheDelta<Height, BlockStatistic> {
    /// Records the statistic of a freshly applied block.
    pub fn record_block(&mut self, statistic: BlockStatistic) {
        self.push(statistic.height, statistic.height, statistic);
    }

    /// Drops the statistic recorded at `height` (block rollback).
    pub fn unrecord_block(&mut self, height: Height) -> bool {
        self.pop(&height).is_some()
    }
}

impl HistoryCacheView<Height, BlockStatistic> {
    /// The statistics of the `count` most recent heights, newest first.
    pub fn recent(&self, count: usize) -> Vec<&BlockStatistic> {
        let mut stats: Vec<&BlockStatistic> = self
            .iter()
            .filter_map(|(_, history)| history.most_recent())
            .collect();
        stats.sort_by(|a, b| b.height.cmp(&a.height));
        stats.truncate(count);
        stats
    }
}
