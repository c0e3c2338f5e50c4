//! Reconnect Sync Task
//!
//! Fires every sync tag when connectivity goes from offline back to online.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::worker::OfflineWorker;

/// Spawns a task that watches the worker's connectivity and triggers a full
/// sync on every offline → online transition.
pub fn spawn_reconnect_task(worker: Arc<OfflineWorker>) -> JoinHandle<()> {
    let mut link = worker.connectivity().subscribe();

    tokio::spawn(async move {
        let mut seen = link.borrow_and_update().reconnects;

        while link.changed().await.is_ok() {
            let reconnects = link.borrow_and_update().reconnects;
            if reconnects > seen {
                info!("Connectivity restored, triggering sync");
                for (tag, outcome) in worker.sync_all().await {
                    debug!("{}: {:?}", tag, outcome);
                }
            }
            seen = reconnects;
        }
        debug!("Connectivity monitor closed, reconnect task exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::queue::{NewOperation, OperationKind, Payload};
    use crate::test_support::ScriptedNetwork;
    use serde_json::json;
    use std::time::Duration;

    async fn wait_until_empty(worker: &OfflineWorker) -> bool {
        for _ in 0..100 {
            if worker.queue().is_empty().await {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_reconnect_triggers_sync() {
        let network = Arc::new(ScriptedNetwork::online());
        let worker = Arc::new(
            OfflineWorker::from_config(&Config::default(), network.clone())
                .await
                .unwrap(),
        );
        worker
            .enqueue(
                NewOperation::new(
                    OperationKind::DeliveryUpdate,
                    Payload::json(json!({"status": "entregado"})),
                )
                .for_resource("5"),
            )
            .await
            .unwrap();

        let handle = spawn_reconnect_task(worker.clone());

        worker.connectivity().report_offline();
        tokio::task::yield_now().await;
        assert_eq!(worker.queue().len().await, 1);

        worker.connectivity().report_online();
        assert!(wait_until_empty(&worker).await);
        assert_eq!(network.call_count(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_back_to_back_offline_online_still_triggers() {
        let network = Arc::new(ScriptedNetwork::online());
        let worker = Arc::new(
            OfflineWorker::from_config(&Config::default(), network.clone())
                .await
                .unwrap(),
        );
        worker
            .enqueue(
                NewOperation::new(
                    OperationKind::DeliveryUpdate,
                    Payload::json(json!({"status": "en_ruta"})),
                )
                .for_resource("8"),
            )
            .await
            .unwrap();

        let handle = spawn_reconnect_task(worker.clone());
        worker.connectivity().report_online();
        tokio::time::sleep(Duration::from_millis(20)).await;

        worker.connectivity().report_offline();
        worker.connectivity().report_online();

        assert!(wait_until_empty(&worker).await);
        assert_eq!(network.call_count(), 1);
        handle.abort();
    }

    #[tokio::test]
    async fn test_first_online_report_does_not_trigger() {
        let network = Arc::new(ScriptedNetwork::online());
        let worker = Arc::new(
            OfflineWorker::from_config(&Config::default(), network.clone())
                .await
                .unwrap(),
        );
        worker
            .enqueue(NewOperation::new(
                OperationKind::LocationUpdate,
                Payload::json(json!({"lat": 0})),
            ))
            .await
            .unwrap();

        let handle = spawn_reconnect_task(worker.clone());
        worker.connectivity().report_online();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(worker.queue().len().await, 1);
        assert_eq!(network.call_count(), 0);
        handle.abort();
    }
}
