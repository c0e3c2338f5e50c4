//! Periodic Sync Task
//!
//! Background task that replays the pending queue at a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::sync::SyncOutcome;
use crate::worker::OfflineWorker;

/// Spawns a background task that triggers every sync tag each interval.
///
/// The first cycle runs after one full interval. The returned handle is
/// aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sync_task(worker.clone(), 30);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sync_task(worker: Arc<OfflineWorker>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Starting periodic sync task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let outcomes = worker.sync_all().await;
            let replayed: usize = outcomes
                .iter()
                .map(|(_, outcome)| match outcome {
                    SyncOutcome::Completed { replayed } | SyncOutcome::Stalled { replayed, .. } => {
                        *replayed
                    }
                    _ => 0,
                })
                .sum();

            if replayed > 0 {
                info!("Periodic sync: replayed {} operations", replayed);
            } else {
                debug!("Periodic sync: nothing replayed");
            }
        }
    })
}
