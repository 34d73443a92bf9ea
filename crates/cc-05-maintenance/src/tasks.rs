//! # Built-In Tasks
//!
//! The periodic callbacks the node runtime schedules: dispatcher-routed
//! history pruning and checkpointing, plus chain height polling against an
//! external peer source.

use crate::errors::TaskError;
use crate::task::{FunctionalTaskCallback, ScheduledTask, TaskResult};
use async_trait::async_trait;
use cc_04_dispatcher::{Dispatcher, ElementInput, MaintenanceRequest, Verdict};
use shared_types::Height;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// External collaborator reporting the network's chain height.
#[async_trait]
pub trait ChainHeightSource: Send + Sync {
    /// The best chain height observed among peers.
    async fn chain_height(&self) -> Result<Height, TaskError>;
}

/// Last network chain height observed by the polling task.
#[derive(Clone, Default)]
pub struct NetworkChainHeight {
    height: Arc<AtomicU64>,
}

impl NetworkChainHeight {
    /// Creates a tracker at height zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last observed network height.
    pub fn observed(&self) -> Height {
        self.height.load(Ordering::Acquire)
    }

    /// Records a newly observed network height.
    pub fn record(&self, height: Height) {
        self.height.fetch_max(height, Ordering::AcqRel);
    }
}

async fn submit_maintenance(
    dispatcher: &Dispatcher,
    request: MaintenanceRequest,
) -> Result<TaskResult, TaskError> {
    let handle = dispatcher.submit(ElementInput::Maintenance(request))?;
    match handle.verdict().await? {
        Verdict::Success => Ok(TaskResult::Continue),
        Verdict::Aborted(reason) => Err(TaskError::Failed(format!(
            "maintenance aborted: {reason:?}"
        ))),
    }
}

/// Periodic history pruning, routed through `dispatcher` so it shares the
/// single-writer discipline with block processing.
pub fn history_pruning_task(
    dispatcher: Arc<Dispatcher>,
    start_delay: Duration,
    repeat_delay: Duration,
) -> ScheduledTask {
    ScheduledTask::new(
        "history_pruning",
        start_delay,
        repeat_delay,
        Box::new(FunctionalTaskCallback::new(move || {
            let dispatcher = dispatcher.clone();
            async move { submit_maintenance(&dispatcher, MaintenanceRequest::Prune).await }
        })),
    )
}

/// Periodic checkpoint of every sub-cache through its storage policy.
pub fn checkpoint_task(
    dispatcher: Arc<Dispatcher>,
    start_delay: Duration,
    repeat_delay: Duration,
) -> ScheduledTask {
    ScheduledTask::new(
        "cache_checkpoint",
        start_delay,
        repeat_delay,
        Box::new(FunctionalTaskCallback::new(move || {
            let dispatcher = dispatcher.clone();
            async move { submit_maintenance(&dispatcher, MaintenanceRequest::Checkpoint).await }
        })),
    )
}

/// Periodic polling of the network chain height.
pub fn chain_height_polling_task(
    source: Arc<dyn ChainHeightSource>,
    tracker: NetworkChainHeight,
    start_delay: Duration,
    repeat_delay: Duration,
) -> ScheduledTask {
    ScheduledTask::new(
        "chain_height_polling",
        start_delay,
        repeat_delay,
        Box::new(FunctionalTaskCallback::new(move || {
            let source = source.clone();
            let tracker = tracker.clone();
            async move {
                let height = source.chain_height().await?;
                tracker.record(height);
                debug!(height, "Network chain height observed");
                Ok(TaskResult::Continue)
            }
        })),
    )
}
