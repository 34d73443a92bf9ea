//! # Prometheus Metrics
//!
//! Process-wide counters and gauges for the state engine and the
//! dispatcher, registered once and exposed through [`gather`].

use crate::TelemetryError;
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    /// Dedicated registry so tests never collide with the default one.
    pub static ref REGISTRY: Registry = Registry::new();

    /// Elements admitted into the dispatcher.
    pub static ref ELEMENTS_ADMITTED: IntCounter =
        IntCounter::new("cascade_elements_admitted_total", "Elements admitted into the dispatcher")
            .expect("metric can be created");

    /// Elements refused at admission.
    pub static ref ELEMENTS_REJECTED: IntCounter =
        IntCounter::new("cascade_elements_rejected_total", "Elements refused at admission")
            .expect("metric can be created");

    /// Delivered verdicts, labeled by outcome.
    pub static ref ELEMENTS_COMPLETED: IntCounterVec = IntCounterVec::new(
        Opts::new("cascade_elements_completed_total", "Verdicts delivered, by outcome"),
        &["outcome"]
    )
    .expect("metric can be created");

    /// Current dispatcher occupancy (in-flight plus queued).
    pub static ref DISPATCHER_QUEUE_DEPTH: IntGauge = IntGauge::new(
        "cascade_dispatcher_queue_depth",
        "In-flight plus queued dispatcher elements"
    )
    .expect("metric can be created");

    /// Composite cache commits.
    pub static ref CACHE_COMMITS: IntCounter =
        IntCounter::new("cascade_cache_commits_total", "Composite cache commits")
            .expect("metric can be created");

    /// Composite cache rollbacks.
    pub static ref CACHE_ROLLBACKS: IntCounter =
        IntCounter::new("cascade_cache_rollbacks_total", "Composite cache rollbacks")
            .expect("metric can be created");

    /// Observer rejections.
    pub static ref OBSERVER_FAILURES: IntCounter =
        IntCounter::new("cascade_observer_failures_total", "Observer rejections")
            .expect("metric can be created");

    /// History records evicted by pruning.
    pub static ref HISTORY_RECORDS_PRUNED: IntCounter =
        IntCounter::new("cascade_history_records_pruned_total", "History records evicted by pruning")
            .expect("metric can be created");
}

/// Handle proving metrics were registered.
pub struct MetricsHandle;

/// Registers every metric with the crate registry.
///
/// Idempotent: a second registration is reported by Prometheus and mapped
/// to a successful no-op so restarts inside one process are harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ELEMENTS_ADMITTED.clone()),
        Box::new(ELEMENTS_REJECTED.clone()),
        Box::new(ELEMENTS_COMPLETED.clone()),
        Box::new(DISPATCHER_QUEUE_DEPTH.clone()),
        Box::new(CACHE_COMMITS.clone()),
        Box::new(CACHE_ROLLBACKS.clone()),
        Box::new(OBSERVER_FAILURES.clone()),
        Box::new(HISTORY_RECORDS_PRUNED.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => {}
            Err(prometheus::Error::AlreadyReg) => {}
            Err(error) => return Err(TelemetryError::MetricsInit(error.to_string())),
        }
    }

    Ok(MetricsHandle)
}

/// Renders the registry in the Prometheus text exposition format.
pub fn gather() -> Result<String, TelemetryError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|error| TelemetryError::MetricsInit(error.to_string()))?;
    String::from_utf8(buffer).map_err(|error| TelemetryError::MetricsInit(error.to_string()))
}
