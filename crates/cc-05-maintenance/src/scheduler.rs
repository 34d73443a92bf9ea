//! # Task Scheduler
//!
//! Runs scheduled tasks on the tokio runtime. A failing callback is logged
//! and retried on its next tick; shutdown stops every loop at its next
//! suspension point.

use crate::task::{ScheduledTask, TaskResult};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Spawns and tracks scheduled task loops.
pub struct TaskScheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskScheduler {
    /// Creates an idle scheduler.
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the loop of `task`.
    pub fn spawn(&self, task: ScheduledTask) {
        let shutdown_rx = self.shutdown_tx.subscribe();
        info!(
            task = %task.name,
            start_delay_ms = task.start_delay.as_millis() as u64,
            repeat_delay_ms = task.repeat_delay.as_millis() as u64,
            "Scheduled task spawned"
        );
        self.handles.lock().push(tokio::spawn(task_loop(task, shutdown_rx)));
    }

    /// Number of spawned task loops.
    pub fn task_count(&self) -> usize {
        self.handles.lock().len()
    }

    /// Signals shutdown and waits for every task loop to finish.
    pub async fn shutdown_and_join(self) {
        let _ = self.shutdown_tx.send(true);
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(error) = handle.await {
                warn!(%error, "Scheduled task panicked");
            }
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn task_loop(task: ScheduledTask, mut shutdown_rx: watch::Receiver<bool>) {
    tokio::select! {
        _ = sleep(task.start_delay) => {}
        _ = shutdown_rx.changed() => {
            debug!(task = %task.name, "Task stopped before first tick");
            return;
        }
    }

    loop {
        match task.callback.run().await {
            Ok(TaskResult::Continue) => {}
            Ok(TaskResult::Stop) => {
                info!(task = %task.name, "Task stopped itself");
                return;
            }
            Err(error) => {
                // retried on the next tick, never escalated
                warn!(task = %task.name, %error, "Task tick failed");
            }
        }

        tokio::select! {
            _ = sleep(task.repeat_delay) => {}
            _ = shutdown_rx.changed() => {
                debug!(task = %task.name, "Task stopped");
                return;
            }
        }
    }
}
