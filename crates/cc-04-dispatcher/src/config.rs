//! # Dispatcher Configuration

use crate::{DEFAULT_CAPACITY, DEFAULT_TRACE_INTERVAL};

/// Behavior when an admission would exceed the queue capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullQueuePolicy {
    /// Raise a hard failure to the producer.
    FailFast,
    /// Return a typed rejection the producer may retry after.
    ReturnError,
}

/// Configuration of one dispatcher instance.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Dispatcher name, used in logs and error messages.
    pub name: String,
    /// Maximum in-flight plus queued elements.
    pub capacity: usize,
    /// Elements between trace log lines; zero disables trace sampling.
    /// Diagnostics only, no functional effect.
    pub trace_interval: u64,
    /// Behavior when the queue is full.
    pub full_queue_policy: FullQueuePolicy,
}

impl DispatcherConfig {
    /// Creates a configuration with default capacity and trace interval.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: DEFAULT_CAPACITY,
            trace_interval: DEFAULT_TRACE_INTERVAL,
            full_queue_policy: FullQueuePolicy::ReturnError,
        }
    }

    /// Overrides the queue capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Overrides the trace sampling interval.
    pub fn with_trace_interval(mut self, trace_interval: u64) -> Self {
        self.trace_interval = trace_interval;
        self
    }

    /// Overrides the full-queue policy.
    pub fn with_full_queue_policy(mut self, policy: FullQueuePolicy) -> Self {
        self.full_queue_policy = policy;
        self
    }
}
