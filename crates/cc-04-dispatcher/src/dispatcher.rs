//! # Dispatcher
//!
//! Admission control plus the single drain task. Admission is serialized
//! under a lock so occupancy checks, id assignment, and enqueue are one
//! atomic step; draining is a lone consumer of the queue, which is what
//! makes completion order equal admission order.

use crate::config::{DispatcherConfig, FullQueuePolicy};
use crate::consumer::ConsumerChain;
use crate::element::{AbortReason, DispatcherElement, ElementInput, ElementState, Verdict};
use crate::errors::DispatcherError;
use crate::metrics::MetricsSink;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct QueuedElement {
    element: DispatcherElement,
    verdict_tx: oneshot::Sender<Verdict>,
}

/// Receives the verdict of one admitted element.
pub struct ElementHandle {
    /// Id assigned at admission.
    pub id: u64,
    verdict_rx: oneshot::Receiver<Verdict>,
}

impl ElementHandle {
    /// Waits for the element's verdict.
    ///
    /// # Errors
    ///
    /// `DispatcherError::VerdictChannelClosed` if the dispatcher dropped the
    /// element without a verdict (process teardown).
    pub async fn verdict(self) -> Result<Verdict, DispatcherError> {
        self.verdict_rx
            .await
            .map_err(|_| DispatcherError::VerdictChannelClosed)
    }
}

/// Bounded, strictly ordered work dispatcher.
pub struct Dispatcher {
    name: String,
    capacity: usize,
    policy: FullQueuePolicy,
    trace_interval: u64,
    /// In-flight plus queued elements.
    occupancy: Arc<AtomicUsize>,
    /// Serializes the admission step.
    admission: Mutex<AdmissionState>,
    tx: mpsc::Sender<QueuedElement>,
    shutdown_tx: watch::Sender<bool>,
    metrics: Arc<dyn MetricsSink>,
    drain_handle: Mutex<Option<JoinHandle<()>>>,
}

struct AdmissionState {
    next_id: u64,
}

impl Dispatcher {
    /// Spawns a dispatcher draining through `chain` on the current runtime.
    pub fn spawn(
        config: DispatcherConfig,
        chain: ConsumerChain,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let occupancy = Arc::new(AtomicUsize::new(0));

        let drain_handle = tokio::spawn(drain_loop(
            config.name.clone(),
            chain,
            rx,
            shutdown_rx,
            occupancy.clone(),
            metrics.clone(),
        ));

        info!(
            dispatcher = %config.name,
            capacity = config.capacity,
            policy = ?config.full_queue_policy,
            "Dispatcher started"
        );

        Self {
            name: config.name,
            capacity: config.capacity,
            policy: config.full_queue_policy,
            trace_interval: config.trace_interval,
            occupancy,
            admission: Mutex::new(AdmissionState { next_id: 0 }),
            tx,
            shutdown_tx,
            metrics,
            drain_handle: Mutex::new(Some(drain_handle)),
        }
    }

    /// Submits `input` for processing.
    ///
    /// # Errors
    ///
    /// - `DispatcherError::Shutdown` once shutdown began.
    /// - `DispatcherError::AdmissionRejected` at capacity under `ReturnError`.
    /// - `DispatcherError::AdmissionFatal` at capacity under `FailFast`.
    pub fn submit(&self, input: ElementInput) -> Result<ElementHandle, DispatcherError> {
        if *self.shutdown_tx.borrow() {
            return Err(DispatcherError::Shutdown {
                name: self.name.clone(),
            });
        }

        let mut admission = self.admission.lock();

        // admission check: in-flight + queued must stay within capacity
        if self.occupancy.load(Ordering::Acquire) >= self.capacity {
            self.metrics.element_rejected();
            return Err(self.full_queue_error());
        }

        admission.next_id += 1;
        let id = admission.next_id;
        let element = DispatcherElement::new(id, input);

        if 0 != self.trace_interval && 0 == id % self.trace_interval {
            info!(
                dispatcher = %self.name,
                element_id = id,
                input = element.input.name(),
                occupancy = self.occupancy.load(Ordering::Acquire),
                "Trace sample"
            );
        }

        let (verdict_tx, verdict_rx) = oneshot::channel();
        let queued = QueuedElement {
            element,
            verdict_tx,
        };

        match self.tx.try_send(queued) {
            Ok(()) => {
                let depth = self.occupancy.fetch_add(1, Ordering::AcqRel) + 1;
                self.metrics.element_admitted();
                self.metrics.queue_depth(depth);
                Ok(ElementHandle { id, verdict_rx })
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                // occupancy accounting keeps the channel from filling first
                self.metrics.element_rejected();
                Err(self.full_queue_error())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(DispatcherError::Shutdown {
                name: self.name.clone(),
            }),
        }
    }

    /// Begins shutdown: pending admissions fail, and elements already
    /// admitted are completed with [`AbortReason::Shutdown`] verdicts
    /// without running the chain.
    ///
    /// Taking the admission lock here orders the flag flip after every
    /// in-progress admission, so each admitted element is seen by the drain
    /// task and receives its verdict.
    pub fn shutdown(&self) {
        let _admission = self.admission.lock();
        if self.shutdown_tx.send(true).is_ok() {
            info!(dispatcher = %self.name, "Dispatcher shutting down");
        }
    }

    /// Shuts down and waits for the drain task to finish delivering
    /// verdicts for every admitted element.
    pub async fn shutdown_and_join(&self) {
        self.shutdown();
        let handle = self.drain_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                warn!(dispatcher = %self.name, %error, "Drain task panicked");
            }
        }
    }

    /// Dispatcher name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// In-flight plus queued elements.
    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    fn full_queue_error(&self) -> DispatcherError {
        match self.policy {
            FullQueuePolicy::ReturnError => DispatcherError::AdmissionRejected {
                name: self.name.clone(),
                capacity: self.capacity,
            },
            FullQueuePolicy::FailFast => DispatcherError::AdmissionFatal {
                name: self.name.clone(),
                capacity: self.capacity,
            },
        }
    }
}

async fn drain_loop(
    name: String,
    chain: ConsumerChain,
    mut rx: mpsc::Receiver<QueuedElement>,
    mut shutdown_rx: watch::Receiver<bool>,
    occupancy: Arc<AtomicUsize>,
    metrics: Arc<dyn MetricsSink>,
) {
    loop {
        tokio::select! {
            queued = rx.recv() => {
                let Some(queued) = queued else { break };
                process_one(&name, &chain, queued, *shutdown_rx.borrow(), &occupancy, metrics.as_ref());
            }
            _ = shutdown_rx.changed() => {
                // deterministic teardown: every element admitted before the
                // flag flipped is still in the queue; give each an explicit
                // shutdown verdict, then stop
                while let Ok(queued) = rx.try_recv() {
                    process_one(&name, &chain, queued, true, &occupancy, metrics.as_ref());
                }
                break;
            }
        }
    }

    debug!(dispatcher = %name, "Drain loop finished");
}

fn process_one(
    name: &str,
    chain: &ConsumerChain,
    queued: QueuedElement,
    shutting_down: bool,
    occupancy: &AtomicUsize,
    metrics: &dyn MetricsSink,
) {
    let QueuedElement {
        mut element,
        verdict_tx,
    } = queued;

    let verdict = if shutting_down {
        Verdict::Aborted(AbortReason::Shutdown)
    } else {
        element.state = ElementState::InFlight;
        chain.process(&mut element)
    };

    element.state = ElementState::Completed;
    let success = verdict.is_success();

    // release the slot before delivery so a caller holding the verdict
    // always observes the freed capacity
    let depth = occupancy.fetch_sub(1, Ordering::AcqRel) - 1;
    metrics.element_completed(success);
    metrics.queue_depth(depth);

    if verdict_tx.send(verdict).is_err() {
        debug!(
            dispatcher = %name,
            element_id = element.id,
            "Verdict receiver dropped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::{ConsumerResult, FunctionalConsumer};
    use crate::metrics::NullMetricsSink;
    use crate::DEFAULT_TRACE_INTERVAL;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn config(capacity: usize, policy: FullQueuePolicy) -> DispatcherConfig {
        DispatcherConfig::new("test_dispatcher")
            .with_capacity(capacity)
            .with_trace_interval(DEFAULT_TRACE_INTERVAL)
            .with_full_queue_policy(policy)
    }

    fn empty_input() -> ElementInput {
        ElementInput::Transactions(vec![])
    }

    #[tokio::test]
    async fn test_submit_and_complete() {
        let chain = ConsumerChain::new().add_stage(Box::new(FunctionalConsumer::new(
            "noop",
            |_e| ConsumerResult::Continue,
        )));
        let dispatcher = Dispatcher::spawn(
            config(8, FullQueuePolicy::ReturnError),
            chain,
            Arc::new(NullMetricsSink),
        );

        let handle = dispatcher.submit(empty_input()).unwrap();
        assert_eq!(handle.id, 1);
        assert_eq!(handle.verdict().await.unwrap(), Verdict::Success);
    }

    #[tokio::test]
    async fn test_backpressure_return_error() {
        // current-thread runtime: the drain task cannot run until we await,
        // so submissions pile up deterministically
        let dispatcher = Dispatcher::spawn(
            config(2, FullQueuePolicy::ReturnError),
            ConsumerChain::new(),
            Arc::new(NullMetricsSink),
        );

        let first = dispatcher.submit(empty_input()).unwrap();
        let _second = dispatcher.submit(empty_input()).unwrap();

        let third = dispatcher.submit(empty_input());
        assert!(matches!(
            third,
            Err(DispatcherError::AdmissionRejected { capacity: 2, .. })
        ));

        // draining frees a slot; the next admission succeeds
        assert!(first.verdict().await.unwrap().is_success());
        assert!(dispatcher.submit(empty_input()).is_ok());
    }

    #[tokio::test]
    async fn test_backpressure_fail_fast() {
        let dispatcher = Dispatcher::spawn(
            config(1, FullQueuePolicy::FailFast),
            ConsumerChain::new(),
            Arc::new(NullMetricsSink),
        );

        let _first = dispatcher.submit(empty_input()).unwrap();
        let second = dispatcher.submit(empty_input());
        assert!(matches!(
            second,
            Err(DispatcherError::AdmissionFatal { capacity: 1, .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fifo_completion_order_under_latency_variance() {
        let completed: Arc<StdMutex<Vec<u64>>> = Arc::new(StdMutex::new(Vec::new()));
        let completed_inner = completed.clone();

        let chain = ConsumerChain::new().add_stage(Box::new(FunctionalConsumer::new(
            "variable_latency",
            move |element: &mut DispatcherElement| {
                // earlier elements sleep longer; order must still hold
                let delay = 20u64.saturating_sub(element.id * 2);
                std::thread::sleep(Duration::from_millis(delay));
                completed_inner.lock().unwrap().push(element.id);
                ConsumerResult::Continue
            },
        )));

        let dispatcher = Dispatcher::spawn(
            config(64, FullQueuePolicy::ReturnError),
            chain,
            Arc::new(NullMetricsSink),
        );

        let handles: Vec<ElementHandle> = (0..8)
            .map(|_| dispatcher.submit(empty_input()).unwrap())
            .collect();
        for handle in handles {
            assert!(handle.verdict().await.unwrap().is_success());
        }

        let order = completed.lock().unwrap().clone();
        assert_eq!(order, (1..=8).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_abort_does_not_affect_siblings() {
        let chain = ConsumerChain::new().add_stage(Box::new(FunctionalConsumer::new(
            "reject_even",
            |element: &mut DispatcherElement| {
                if 0 == element.id % 2 {
                    ConsumerResult::Abort(AbortReason::Validation("even id".into()))
                } else {
                    ConsumerResult::Continue
                }
            },
        )));

        let dispatcher = Dispatcher::spawn(
            config(8, FullQueuePolicy::ReturnError),
            chain,
            Arc::new(NullMetricsSink),
        );

        let first = dispatcher.submit(empty_input()).unwrap();
        let second = dispatcher.submit(empty_input()).unwrap();
        let third = dispatcher.submit(empty_input()).unwrap();

        assert!(first.verdict().await.unwrap().is_success());
        assert!(matches!(
            second.verdict().await.unwrap(),
            Verdict::Aborted(AbortReason::Validation(_))
        ));
        assert!(third.verdict().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_shutdown_aborts_queued_elements() {
        let dispatcher = Dispatcher::spawn(
            config(4, FullQueuePolicy::ReturnError),
            ConsumerChain::new(),
            Arc::new(NullMetricsSink),
        );

        let first = dispatcher.submit(empty_input()).unwrap();
        let second = dispatcher.submit(empty_input()).unwrap();
        dispatcher.shutdown();

        assert_eq!(
            first.verdict().await.unwrap(),
            Verdict::Aborted(AbortReason::Shutdown)
        );
        assert_eq!(
            second.verdict().await.unwrap(),
            Verdict::Aborted(AbortReason::Shutdown)
        );

        assert!(matches!(
            dispatcher.submit(empty_input()),
            Err(DispatcherError::Shutdown { .. })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_and_join_drains() {
        let dispatcher = Dispatcher::spawn(
            config(4, FullQueuePolicy::ReturnError),
            ConsumerChain::new(),
            Arc::new(NullMetricsSink),
        );

        let handle = dispatcher.submit(empty_input()).unwrap();
        dispatcher.shutdown_and_join().await;
        assert_eq!(
            handle.verdict().await.unwrap(),
            Verdict::Aborted(AbortReason::Shutdown)
        );
    }

    #[tokio::test]
    async fn test_occupancy_tracking() {
        let dispatcher = Dispatcher::spawn(
            config(4, FullQueuePolicy::ReturnError),
            ConsumerChain::new(),
            Arc::new(NullMetricsSink),
        );

        assert_eq!(dispatcher.occupancy(), 0);
        let handle = dispatcher.submit(empty_input()).unwrap();
        assert_eq!(dispatcher.occupancy(), 1);
        handle.verdict().await.unwrap();
        assert_eq!(dispatcher.occupancy(), 0);
    }
}
