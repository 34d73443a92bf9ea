//! # Prometheus Metrics Sink
//!
//! Adapts the dispatcher's injected [`MetricsSink`] to the process-wide
//! Prometheus registry.

use cascade_telemetry::metrics::{
    DISPATCHER_QUEUE_DEPTH, ELEMENTS_ADMITTED, ELEMENTS_COMPLETED, ELEMENTS_REJECTED,
};
use cc_04_dispatcher::MetricsSink;

/// Dispatcher metrics sink backed by the Prometheus registry.
pub struct PrometheusMetricsSink;

impl MetricsSink for PrometheusMetricsSink {
    fn element_admitted(&self) {
        ELEMENTS_ADMITTED.inc();
    }

    fn element_rejected(&self) {
        ELEMENTS_REJECTED.inc();
    }

    fn element_completed(&self, success: bool) {
        let outcome = if success { "success" } else { "aborted" };
        ELEMENTS_COMPLETED.with_label_values(&[outcome]).inc();
    }

    fn queue_depth(&self, depth: usize) {
        DISPATCHER_QUEUE_DEPTH.set(depth as i64);
    }
}
