//! # Node Runtime Library
//!
//! Exposes the runtime's wiring for the binary and the integration tests.
//!
//! ## Module Layout
//!
//! - `config` - runtime configuration with environment overrides
//! - `wiring` - composite cache, pipeline, dispatcher and task assembly
//! - `stages` - consumer chain stages (structure checks, execution)
//! - `metrics_sink` - Prometheus adapter for the dispatcher metrics
//! - `random` / `workload` - seedable workload generation

pub mod config;
pub mod metrics_sink;
pub mod random;
pub mod stages;
pub mod wiring;
pub mod workload;

pub use config::{ConfigError, NodeConfig};
pub use metrics_sink::PrometheusMetricsSink;
pub use random::RandomSource;
pub use stages::{undo_block, BlockStructureStage, ExecutionStage};
pub use wiring::{
    build_composite_cache, build_node, build_observer_pipeline, LocalHeightSource, NodeCore,
};
pub use workload::WorkloadGenerator;
