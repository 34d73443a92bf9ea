//! # Metrics Sink
//!
//! The dispatcher reports its counters through an injected sink instead of
//! touching process-wide metric state; the runtime wires a Prometheus-backed
//! implementation, tests and tools pass [`NullMetricsSink`].

/// Receiver of dispatcher metrics.
pub trait MetricsSink: Send + Sync {
    /// An element passed admission.
    fn element_admitted(&self) {}

    /// An element was refused at admission.
    fn element_rejected(&self) {}

    /// A verdict was delivered.
    fn element_completed(&self, success: bool) {
        let _ = success;
    }

    /// Queue occupancy after an admission or completion.
    fn queue_depth(&self, depth: usize) {
        let _ = depth;
    }
}

/// Sink discarding every report.
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {}
