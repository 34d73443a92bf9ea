//! # Node Wiring
//!
//! Builds the composite cache, the observer pipeline, the consumer chain
//! and the dispatcher, and ties the maintenance tasks to them.
//!
//! ## Startup Sequence
//!
//! 1. Build the composite cache (membership fixed here, before first use)
//! 2. Register the observer pipeline (pruning observer last)
//! 3. Assemble the consumer chain (structure checks, then execution)
//! 4. Spawn the dispatcher with the Prometheus metrics sink
//! 5. Schedule maintenance tasks (pruning, checkpoint, height polling)

use crate::config::NodeConfig;
use crate::metrics_sink::PrometheusMetricsSink;
use crate::stages::{undo_block, BlockStructureStage, ExecutionStage};
use anyhow::Context;
use async_trait::async_trait;
use cc_02_aggregate_cache::{
    account_state_cache, block_statistic_cache, hash_lock_cache, CacheCheckpoint, CompositeCache,
    CompositeCacheBuilder, CompositeView, HistoryCacheStorage, PlainCacheStorage,
};
use cc_03_observers::{
    BalanceChangeObserver, BalanceTransferObserver, BlockStatisticObserver, HashLockObserver,
    HistoryPruningObserver, ObserverPipeline,
};
use cc_04_dispatcher::{
    ConsumerChain, Dispatcher, DispatcherConfig, DispatcherError, ElementHandle, ElementInput,
};
use cc_05_maintenance::{
    chain_height_polling_task, checkpoint_task, history_pruning_task, ChainHeightSource,
    NetworkChainHeight, TaskError, TaskScheduler,
};
use parking_lot::Mutex;
use shared_types::{
    AccountState, Address, Amount, Block, BlockStatistic, Hash, HashLockInfo, Height, Transaction,
};
use std::sync::Arc;
use tracing::info;

/// Builds the composite cache with the node's sub-caches registered in
/// their canonical order.
pub fn build_composite_cache(config: &NodeConfig) -> anyhow::Result<Arc<CompositeCache>> {
    let mut builder = CompositeCacheBuilder::new();
    builder
        .add_sub_cache(
            Arc::new(account_state_cache()),
            Arc::new(PlainCacheStorage::<Address, AccountState>::new()),
        )
        .context("registering account state cache")?;
    builder
        .add_sub_cache(
            Arc::new(block_statistic_cache(config.statistic_retention)),
            Arc::new(HistoryCacheStorage::<Height, BlockStatistic>::new()),
        )
        .context("registering block statistic cache")?;
    builder
        .add_sub_cache(
            Arc::new(hash_lock_cache()),
            Arc::new(HistoryCacheStorage::<Hash, HashLockInfo>::new()),
        )
        .context("registering hash lock cache")?;
    Ok(Arc::new(builder.build()))
}

/// Registers the node's observers in execution order.
///
/// The pruning observer goes last so every value observer has finished
/// with the block before expired history is evicted.
pub fn build_observer_pipeline(config: &NodeConfig) -> ObserverPipeline {
    let mut pipeline = ObserverPipeline::new();
    pipeline
        .register(Box::new(BalanceTransferObserver))
        .register(Box::new(BalanceChangeObserver))
        .register(Box::new(HashLockObserver))
        .register(Box::new(BlockStatisticObserver))
        .register(Box::new(HistoryPruningObserver::new(config.prune_interval)));
    pipeline
}

/// The wired node core.
pub struct NodeCore {
    /// Runtime configuration.
    pub config: NodeConfig,
    /// The process-wide composite cache.
    pub cache: Arc<CompositeCache>,
    /// The observer pipeline (shared with reorg handling).
    pub pipeline: Arc<ObserverPipeline>,
    /// The block dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Last observed network chain height.
    pub network_height: NetworkChainHeight,
    /// Most recent checkpoint captured by the maintenance task.
    pub last_checkpoint: Arc<Mutex<Option<Vec<CacheCheckpoint>>>>,
}

/// Builds and starts the node core on the current tokio runtime.
pub fn build_node(config: NodeConfig) -> anyhow::Result<NodeCore> {
    config.validate()?;

    let cache = build_composite_cache(&config)?;
    let pipeline = Arc::new(build_observer_pipeline(&config));
    let last_checkpoint: Arc<Mutex<Option<Vec<CacheCheckpoint>>>> = Arc::new(Mutex::new(None));

    let chain = ConsumerChain::new()
        .add_stage(Box::new(BlockStructureStage::new(cache.clone())))
        .add_stage(Box::new(ExecutionStage::new(
            cache.clone(),
            pipeline.clone(),
            last_checkpoint.clone(),
        )));

    let dispatcher = Arc::new(Dispatcher::spawn(
        DispatcherConfig::new("block_dispatcher")
            .with_capacity(config.dispatcher_capacity)
            .with_trace_interval(config.trace_interval)
            .with_full_queue_policy(config.full_queue_policy),
        chain,
        Arc::new(PrometheusMetricsSink),
    ));

    info!(
        sub_caches = cache.sub_cache_count(),
        observers = pipeline.len(),
        "Node core wired"
    );

    Ok(NodeCore {
        config,
        cache,
        pipeline,
        dispatcher,
        network_height: NetworkChainHeight::new(),
        last_checkpoint,
    })
}

impl NodeCore {
    /// Seeds the genesis account balances and commits them at height zero.
    pub fn seed_genesis(
        &self,
        accounts: impl IntoIterator<Item = (Address, Amount)>,
    ) -> anyhow::Result<()> {
        use cc_02_aggregate_cache::{AccountStateCacheDelta, ACCOUNT_STATE_CACHE_NAME};

        let mut delta = self.cache.create_delta()?;
        {
            let state = delta.sub_cache_mut::<AccountStateCacheDelta>(ACCOUNT_STATE_CACHE_NAME)?;
            let mut seeded = 0usize;
            for (address, amount) in accounts {
                state.credit(&address, amount, 0);
                seeded += 1;
            }
            info!(accounts = seeded, "Genesis accounts seeded");
        }
        self.cache.commit(delta, 0)?;
        Ok(())
    }

    /// Submits a consecutive block range for processing.
    pub fn submit_blocks(&self, blocks: Vec<Block>) -> Result<ElementHandle, DispatcherError> {
        self.dispatcher.submit(ElementInput::Blocks(blocks))
    }

    /// Submits a batch of unconfirmed transactions for validation.
    pub fn submit_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<ElementHandle, DispatcherError> {
        self.dispatcher
            .submit(ElementInput::Transactions(transactions))
    }

    /// Unwinds the chain tip (reorg path).
    ///
    /// Only valid while the dispatcher is idle; reorgs are serialized
    /// against block application by the sync collaborator driving them.
    pub fn rollback_block(&self, block: &Block) -> anyhow::Result<()> {
        undo_block(&self.cache, &self.pipeline, block)
    }

    /// A read-only snapshot of the composite state.
    pub fn view(&self) -> CompositeView {
        self.cache.create_view()
    }

    /// Schedules the maintenance tasks onto `scheduler`.
    pub fn start_maintenance(
        &self,
        scheduler: &TaskScheduler,
        height_source: Arc<dyn ChainHeightSource>,
    ) {
        scheduler.spawn(history_pruning_task(
            self.dispatcher.clone(),
            self.config.task_start_delay,
            self.config.prune_task_interval,
        ));
        scheduler.spawn(checkpoint_task(
            self.dispatcher.clone(),
            self.config.task_start_delay,
            self.config.checkpoint_interval,
        ));
        scheduler.spawn(chain_height_polling_task(
            height_source,
            self.network_height.clone(),
            self.config.task_start_delay,
            self.config.height_poll_interval,
        ));
    }

    /// Shuts the dispatcher down and waits for verdict delivery.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown_and_join().await;
    }
}

/// Height source reporting the local cache height.
///
/// Stands in for the peer network client, which is an external
/// collaborator of this core.
pub struct LocalHeightSource {
    cache: Arc<CompositeCache>,
}

impl LocalHeightSource {
    /// Creates a source over `cache`.
    pub fn new(cache: Arc<CompositeCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ChainHeightSource for LocalHeightSource {
    async fn chain_height(&self) -> Result<Height, TaskError> {
        Ok(self.cache.height())
    }
}
