//! # Cascade-Chain Node Runtime
//!
//! Entry point of the node core. Wires the composite cache, the observer
//! pipeline, the dispatcher and the maintenance scheduler, then drives a
//! deterministic local workload through the pipeline until shutdown.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (tracing + Prometheus)
//! 2. Load configuration from the environment
//! 3. Build the node core and seed the genesis accounts
//! 4. Start maintenance tasks (pruning, checkpoint, height polling)
//! 5. Produce blocks until ctrl-c, then drain and stop

use anyhow::Context;
use cascade_telemetry::{init_telemetry, TelemetryConfig};
use cc_04_dispatcher::DispatcherError;
use node_runtime::{
    build_node, LocalHeightSource, NodeConfig, NodeCore, RandomSource, WorkloadGenerator,
};
use cc_05_maintenance::TaskScheduler;
use shared_types::Block;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

fn env_u64(variable: &str, default: u64) -> u64 {
    std::env::var(variable)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let telemetry_config = TelemetryConfig::from_env();
    let _telemetry = init_telemetry(&telemetry_config).context("initializing telemetry")?;

    let config = NodeConfig::from_env().context("loading configuration")?;
    info!(?config, "Starting Cascade-Chain node core");

    let node = Arc::new(build_node(config).context("wiring node core")?);

    let seed = env_u64("CASCADE_WORKLOAD_SEED", 42);
    let workload = WorkloadGenerator::new(RandomSource::from_seed(seed), 8);
    node.seed_genesis(workload.genesis_balances(1_000_000))
        .context("seeding genesis")?;

    let scheduler = TaskScheduler::new();
    node.start_maintenance(
        &scheduler,
        Arc::new(LocalHeightSource::new(node.cache.clone())),
    );

    let block_time = Duration::from_millis(env_u64("CASCADE_BLOCK_TIME_MS", 500));
    let (stop_tx, stop_rx) = watch::channel(false);
    let producer = tokio::spawn(harvest_loop(node.clone(), workload, block_time, stop_rx));

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("Shutdown signal received");

    let _ = stop_tx.send(true);
    if let Err(join_error) = producer.await {
        warn!(%join_error, "Harvest loop panicked");
    }
    scheduler.shutdown_and_join().await;
    node.shutdown().await;

    let view = node.view();
    for (name, summary) in view.summaries() {
        info!(
            cache = name,
            entries = summary.entries,
            "Final sub-cache summary"
        );
    }
    info!(height = node.cache.height(), "Node stopped");
    Ok(())
}

/// Produces one block per tick and submits it, retrying the same block on
/// backpressure so the chain linkage stays intact.
async fn harvest_loop(
    node: Arc<NodeCore>,
    mut workload: WorkloadGenerator,
    block_time: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(block_time);
    let mut pending: Option<Block> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop_rx.changed() => return,
        }

        let block = match pending.take() {
            Some(block) => block,
            None => workload.next_block(4),
        };
        let height = block.height;

        match node.submit_blocks(vec![block.clone()]) {
            Ok(handle) => match handle.verdict().await {
                Ok(verdict) if verdict.is_success() => {
                    debug!(height, "Block accepted");
                }
                Ok(verdict) => {
                    error!(height, ?verdict, "Block rejected; stopping producer");
                    return;
                }
                Err(delivery) => {
                    warn!(height, %delivery, "Verdict lost; stopping producer");
                    return;
                }
            },
            Err(DispatcherError::AdmissionRejected { .. }) => {
                debug!(height, "Backpressure; retrying next tick");
                pending = Some(block);
            }
            Err(submit_error) => {
                warn!(height, %submit_error, "Dispatcher unavailable; stopping producer");
                return;
            }
        }
    }
}
