//! Offline Worker
//!
//! Wires the cache, interceptor, queue and sync coordinator into the set of
//! lifecycle hooks a hosting runtime calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::{CacheStats, CacheStore, CacheVersion, PartitionName};
use crate::config::Config;
use crate::error::{OfflineError, Result};
use crate::fetch::{Connectivity, FetchRequest, FetchResponse, Network, NetworkError};
use crate::intercept::{Interceptor, PrecacheReport};
use crate::push::{build_notification, resolve_click, ClickOutcome, ClientWindow, Notification, PushPayload};
use crate::queue::{NewOperation, OperationKind, PendingOperation, PendingQueue, SyncTag};
use crate::strategy::StrategySelector;
use crate::sync::{SyncCoordinator, SyncEndpoints, SyncOutcome};

// == Worker Hooks ==
/// Entry points driven by the hosting runtime.
#[async_trait]
pub trait WorkerHooks: Send + Sync {
    async fn on_intercept(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, NetworkError>;

    async fn on_sync_trigger(&self, tag: SyncTag) -> SyncOutcome;

    async fn on_push_received(&self, raw: &[u8]) -> Notification;
}

/// Queue counters reported next to the cache statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub by_kind: BTreeMap<OperationKind, usize>,
    pub pending_bytes: usize,
    pub dead_letters: usize,
    pub capacity: usize,
}

// == Offline Worker ==
pub struct OfflineWorker {
    interceptor: Interceptor,
    coordinator: SyncCoordinator,
    queue: Arc<PendingQueue>,
    precache_urls: Vec<String>,
}

impl OfflineWorker {
    pub fn new(interceptor: Interceptor, coordinator: SyncCoordinator, precache_urls: Vec<String>) -> Self {
        let queue = coordinator.queue().clone();
        Self {
            interceptor,
            coordinator,
            queue,
            precache_urls,
        }
    }

    /// Builds every component from `config` around the given network.
    pub async fn from_config(config: &Config, network: Arc<dyn Network>) -> Result<Self> {
        let version = CacheVersion::new(&config.cache_version)?;
        let cache = Arc::new(RwLock::new(CacheStore::new(
            version,
            config.max_entries_per_partition,
            config.max_entry_bytes,
        )));

        let queue = match &config.queue_path {
            Some(path) => PendingQueue::open(path, config.max_pending_operations).await?,
            None => PendingQueue::in_memory(config.max_pending_operations),
        };

        let interceptor = Interceptor::new(
            cache,
            network.clone(),
            StrategySelector::default(),
            Connectivity::new(),
            config.offline_page.clone(),
        );
        let coordinator = SyncCoordinator::new(
            Arc::new(queue),
            network,
            SyncEndpoints::default(),
            config.retry_policy(),
        );

        Ok(Self::new(interceptor, coordinator, config.precache_urls.clone()))
    }

    // == Lifecycle ==
    /// Stages `version` and fills its static partition from the precache list.
    pub async fn on_install(&self, version: &CacheVersion) -> PrecacheReport {
        self.interceptor.cache().write().await.stage(version);
        self.interceptor.precache(version, &self.precache_urls).await
    }

    /// Switches readers to `version` and drops every other partition.
    pub async fn on_activate(&self, version: &CacheVersion) -> Vec<PartitionName> {
        self.interceptor.cache().write().await.activate(version)
    }

    pub fn on_notification_click(
        &self,
        action: Option<&str>,
        data: &Value,
        clients: &[ClientWindow],
    ) -> ClickOutcome {
        resolve_click(action, data, clients)
    }

    // == Queue ==
    /// Enqueues an operation, shedding the oldest photo upload once if the
    /// queue is full.
    pub async fn enqueue(&self, op: NewOperation) -> Result<PendingOperation> {
        match self.queue.enqueue(op.clone()).await {
            Err(OfflineError::QueueFull(reason)) => {
                match self.queue.shed_oldest(OperationKind::PhotoUpload).await? {
                    Some(shed) => {
                        warn!("Shed photo #{} to queue {}", shed.id, op.kind);
                        self.queue.enqueue(op).await
                    }
                    None => Err(OfflineError::QueueFull(reason)),
                }
            }
            other => other,
        }
    }

    /// Removes a queued operation along with its retry bookkeeping.
    pub async fn remove(&self, id: u64) -> Result<bool> {
        let removed = self.queue.remove(id).await?;
        self.coordinator.forget(id).await;
        Ok(removed)
    }

    pub async fn sync_all(&self) -> Vec<(SyncTag, SyncOutcome)> {
        self.coordinator.trigger_all().await
    }

    // == Stats ==
    pub async fn cache_stats(&self) -> CacheStats {
        self.interceptor.cache().read().await.stats()
    }

    pub async fn queue_stats(&self) -> QueueStats {
        let pending = self.queue.snapshot(None).await;
        QueueStats {
            pending: pending.len(),
            by_kind: self.queue.len_by_kind().await.into_iter().collect(),
            pending_bytes: pending.iter().map(|op| op.payload.size_bytes()).sum(),
            dead_letters: self.queue.dead_letters().await.len(),
            capacity: self.queue.capacity(),
        }
    }

    pub async fn cache_version(&self) -> Option<CacheVersion> {
        self.interceptor.cache().read().await.active_version()
    }

    pub async fn partition_names(&self) -> Vec<String> {
        self.interceptor.cache().read().await.partition_names()
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    pub fn connectivity(&self) -> &Connectivity {
        self.interceptor.connectivity()
    }
}

#[async_trait]
impl WorkerHooks for OfflineWorker {
    async fn on_intercept(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, NetworkError> {
        self.interceptor.handle(request).await
    }

    async fn on_sync_trigger(&self, tag: SyncTag) -> SyncOutcome {
        self.coordinator.trigger(tag).await
    }

    async fn on_push_received(&self, raw: &[u8]) -> Notification {
        let notification = build_notification(PushPayload::parse(raw));
        info!("Push received: {}", notification.title);
        notification
    }
}
