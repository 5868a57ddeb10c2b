//! Background refresh scheduling
//!
//! Runs a refresh at startup and then on a fixed interval until shutdown is
//! broadcast. Failures are logged and the loop carries on; cached entries
//! from the last good cycle stay valid until their TTL runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::Refresher;
use crate::constants::refresh;

/// Owns the background refresh tasks
pub struct RefreshScheduler {
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Create a scheduler with no running tasks
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Start the periodic refresh task
    ///
    /// The first tick fires immediately, so the cache is populated at startup.
    pub fn start_refresh_task(
        &mut self,
        refresher: Arc<Refresher>,
        period: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match refresher.run_once().await {
                            Ok(summary) => {
                                for (name, count) in &summary.section_sizes {
                                    debug!("Section {}: {} records", name, count);
                                }
                            }
                            Err(e) => error!("Scheduled refresh failed: {}", e),
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Refresh task received shutdown signal");
                        break;
                    }
                }
            }
        });

        info!("Scheduled dataset refresh every {}s", period.as_secs());
        self.tasks.push(task);
    }

    /// Wait for every task to stop, giving up on each after a timeout
    pub async fn shutdown_all(self) {
        debug!("Stopping refresh tasks");

        for task in self.tasks {
            if tokio::time::timeout(refresh::TASK_SHUTDOWN_TIMEOUT, task)
                .await
                .is_err()
            {
                warn!(
                    "Refresh task shutdown timed out after {:?}",
                    refresh::TASK_SHUTDOWN_TIMEOUT
                );
            }
        }

        debug!("All refresh tasks stopped");
    }

    /// Number of tasks started
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}
