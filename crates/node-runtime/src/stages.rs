//! # Consumer Stages
//!
//! The stages the dispatcher runs every element through: structural checks
//! for block ranges, then execution against the composite cache. Execution
//! is where exactly-once state application lives: a delta is opened per
//! block, observers run in Commit mode, and the delta is either committed
//! at the block height or rolled back without a trace.

use cascade_telemetry::metrics::{
    CACHE_COMMITS, CACHE_ROLLBACKS, HISTORY_RECORDS_PRUNED, OBSERVER_FAILURES,
};
use cc_02_aggregate_cache::{
    AccountStateCacheView, CacheCheckpoint, CompositeCache, ACCOUNT_STATE_CACHE_NAME,
};
use cc_03_observers::{extract_from_block, NotifyMode, ObserverPipeline};
use cc_04_dispatcher::{
    AbortReason, Consumer, ConsumerResult, DispatcherElement, ElementInput, MaintenanceRequest,
};
use parking_lot::Mutex;
use shared_types::{short_hash, Block};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Validates the structure of a submitted block range.
///
/// Checks hash integrity, consecutive heights, and parent linkage within
/// the range, and that the range starts directly above the cache height.
pub struct BlockStructureStage {
    cache: Arc<CompositeCache>,
}

impl BlockStructureStage {
    /// Creates the stage over `cache`.
    pub fn new(cache: Arc<CompositeCache>) -> Self {
        Self { cache }
    }

    fn check_range(&self, blocks: &[Block]) -> Result<(), String> {
        let Some(first) = blocks.first() else {
            return Err("empty block range".to_string());
        };

        let expected_first = self.cache.height() + 1;
        if first.height != expected_first {
            return Err(format!(
                "range starts at height {} but cache is at {}",
                first.height,
                self.cache.height()
            ));
        }

        let mut previous: Option<&Block> = None;
        for block in blocks {
            if block.hash != block.compute_hash() {
                return Err(format!("block {} hash mismatch", block.height));
            }
            if let Some(previous) = previous {
                if block.height != previous.height + 1 {
                    return Err(format!(
                        "height {} does not follow {}",
                        block.height, previous.height
                    ));
                }
                if block.parent_hash != previous.hash {
                    return Err(format!(
                        "block {} parent hash does not link to {}",
                        block.height, previous.height
                    ));
                }
            }
            previous = Some(block);
        }
        Ok(())
    }
}

impl Consumer for BlockStructureStage {
    fn name(&self) -> &str {
        "block_structure"
    }

    fn consume(&self, element: &mut DispatcherElement) -> ConsumerResult {
        let ElementInput::Blocks(blocks) = &element.input else {
            return ConsumerResult::Continue;
        };

        match self.check_range(blocks) {
            Ok(()) => ConsumerResult::Continue,
            Err(reason) => ConsumerResult::Abort(AbortReason::Validation(reason)),
        }
    }
}

/// Executes elements against the composite cache.
pub struct ExecutionStage {
    cache: Arc<CompositeCache>,
    pipeline: Arc<ObserverPipeline>,
    last_checkpoint: Arc<Mutex<Option<Vec<CacheCheckpoint>>>>,
}

impl ExecutionStage {
    /// Creates the stage over `cache` and `pipeline`.
    pub fn new(
        cache: Arc<CompositeCache>,
        pipeline: Arc<ObserverPipeline>,
        last_checkpoint: Arc<Mutex<Option<Vec<CacheCheckpoint>>>>,
    ) -> Self {
        Self {
            cache,
            pipeline,
            last_checkpoint,
        }
    }

    fn apply_blocks(&self, blocks: &[Block]) -> ConsumerResult {
        for block in blocks {
            let mut delta = match self.cache.create_delta() {
                Ok(delta) => delta,
                Err(violation) => {
                    // the drain task is the only writer, so this is a bug
                    return ConsumerResult::Abort(AbortReason::Internal(violation.to_string()));
                }
            };

            let notifications = extract_from_block(block);
            match self.pipeline.notify_all(
                &notifications,
                &mut delta,
                block.height,
                NotifyMode::Commit,
            ) {
                Ok(()) => {
                    if let Err(fatal) = self.cache.commit(delta, block.height) {
                        // partial commit corrupts the composite state
                        error!(%fatal, height = block.height, "Unrecoverable commit failure");
                        panic!("composite cache commit failed: {fatal}");
                    }
                    CACHE_COMMITS.inc();
                    debug!(
                        height = block.height,
                        hash = %short_hash(&block.hash),
                        transactions = block.transactions.len(),
                        "Block applied"
                    );
                }
                Err(rejection) => {
                    OBSERVER_FAILURES.inc();
                    self.cache.rollback(delta);
                    CACHE_ROLLBACKS.inc();
                    return ConsumerResult::Abort(AbortReason::Observer(rejection.to_string()));
                }
            }
        }
        ConsumerResult::Continue
    }

    fn validate_transactions(
        &self,
        transactions: &[shared_types::Transaction],
    ) -> ConsumerResult {
        let view = self.cache.create_view();
        let accounts = match view.sub_cache::<AccountStateCacheView>(ACCOUNT_STATE_CACHE_NAME) {
            Ok(accounts) => accounts,
            Err(error) => return ConsumerResult::Abort(AbortReason::Internal(error.to_string())),
        };

        for tx in transactions {
            let required = tx.amount + tx.fee;
            let available = accounts.balance(&tx.sender);
            if available < required {
                return ConsumerResult::Abort(AbortReason::Validation(format!(
                    "sender {} has {} of required {}",
                    hex::encode(tx.sender),
                    available,
                    required
                )));
            }
        }
        ConsumerResult::Complete
    }

    fn maintain(&self, request: &MaintenanceRequest) -> ConsumerResult {
        match request {
            MaintenanceRequest::Prune => {
                let height = self.cache.height();
                let mut delta = match self.cache.create_delta() {
                    Ok(delta) => delta,
                    Err(violation) => {
                        return ConsumerResult::Abort(AbortReason::Internal(
                            violation.to_string(),
                        ))
                    }
                };

                let evicted = delta.prune(height);
                if let Err(fatal) = self.cache.commit(delta, height) {
                    error!(%fatal, height, "Unrecoverable commit failure during prune");
                    panic!("composite cache commit failed: {fatal}");
                }
                CACHE_COMMITS.inc();
                HISTORY_RECORDS_PRUNED.inc_by(evicted as u64);
                info!(height, evicted, "Maintenance prune completed");
                ConsumerResult::Complete
            }
            MaintenanceRequest::Checkpoint => match self.cache.save_checkpoint() {
                Ok(checkpoints) => {
                    info!(sub_caches = checkpoints.len(), "Checkpoint captured");
                    *self.last_checkpoint.lock() = Some(checkpoints);
                    ConsumerResult::Complete
                }
                Err(failure) => {
                    // checkpoint not completed; surfaced to the caller
                    ConsumerResult::Abort(AbortReason::Internal(failure.to_string()))
                }
            },
        }
    }
}

impl Consumer for ExecutionStage {
    fn name(&self) -> &str {
        "execution"
    }

    fn consume(&self, element: &mut DispatcherElement) -> ConsumerResult {
        let result = match &element.input {
            ElementInput::Blocks(blocks) => self.apply_blocks(blocks),
            ElementInput::Transactions(transactions) => self.validate_transactions(transactions),
            ElementInput::Maintenance(request) => self.maintain(request),
        };
        element.processed_height = Some(self.cache.height());
        result
    }
}

/// Unwinds `block` from the cache tip (reorg support).
///
/// Replays the block's notifications in Rollback mode and commits the
/// resulting state at the parent height. Must only run while no other
/// writer holds the composite delta, which in practice means through the
/// same serialized path block application uses.
pub fn undo_block(
    cache: &CompositeCache,
    pipeline: &ObserverPipeline,
    block: &Block,
) -> anyhow::Result<()> {
    let mut delta = cache.create_delta()?;
    let notifications = extract_from_block(block);
    pipeline.notify_all(&notifications, &mut delta, block.height, NotifyMode::Rollback)?;
    cache.commit(delta, block.height.saturating_sub(1))?;
    CACHE_COMMITS.inc();
    info!(height = block.height, "Block unwound");
    Ok(())
}
