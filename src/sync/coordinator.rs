//! Sync Coordinator
//!
//! Replays pending operations against the origin, one kind per trigger.

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::retry::{AttemptLedger, RetryPolicy};
use crate::fetch::{FetchRequest, Network};
use crate::queue::{OperationKind, Payload, PendingOperation, PendingQueue, SyncTag};

/// Header carrying the queued operation id(s), letting the origin drop replays
/// it has already applied.
pub const OPERATION_ID_HEADER: &str = "x-offline-operation-id";

// == Sync Endpoints ==
/// Origin endpoints used for replay. `{id}` is replaced by the resource id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEndpoints {
    pub location_batch: String,
    pub delivery_status: String,
    pub photo_upload: String,
}

impl Default for SyncEndpoints {
    fn default() -> Self {
        Self {
            location_batch: "/api/driver/location/batch".to_string(),
            delivery_status: "/api/delivery-points/{id}/status".to_string(),
            photo_upload: "/api/delivery-points/{id}/photos".to_string(),
        }
    }
}

// == Sync Outcome ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every operation of the kind was confirmed
    Completed { replayed: usize },
    /// The head operation failed; it and everything behind it stay queued
    Stalled {
        replayed: usize,
        remaining: usize,
        error: String,
    },
    /// The kind is backing off after a failure
    Deferred { retry_in_ms: u64 },
    /// Another replay of the same kind is in progress
    AlreadyRunning,
}

#[derive(Debug, Default)]
struct KindLocks {
    location: Mutex<()>,
    delivery: Mutex<()>,
    photo: Mutex<()>,
}

impl KindLocks {
    fn get(&self, kind: OperationKind) -> &Mutex<()> {
        match kind {
            OperationKind::LocationUpdate => &self.location,
            OperationKind::DeliveryUpdate => &self.delivery,
            OperationKind::PhotoUpload => &self.photo,
        }
    }
}

// == Sync Coordinator ==
pub struct SyncCoordinator {
    queue: Arc<PendingQueue>,
    network: Arc<dyn Network>,
    endpoints: SyncEndpoints,
    policy: RetryPolicy,
    locks: KindLocks,
    ledger: Mutex<AttemptLedger>,
}

impl SyncCoordinator {
    pub fn new(
        queue: Arc<PendingQueue>,
        network: Arc<dyn Network>,
        endpoints: SyncEndpoints,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            network,
            endpoints,
            policy,
            locks: KindLocks::default(),
            ledger: Mutex::new(AttemptLedger::default()),
        }
    }

    // == Trigger ==
    /// Runs one replay cycle for the kind selected by `tag`.
    ///
    /// Failures never propagate: they are logged and reported in the outcome,
    /// and the failing operation is retried on the next trigger.
    pub async fn trigger(&self, tag: SyncTag) -> SyncOutcome {
        let kind = tag.kind();
        let Ok(_running) = self.locks.get(kind).try_lock() else {
            debug!("{} already running", tag);
            return SyncOutcome::AlreadyRunning;
        };

        if let Some(wait) = self.ledger.lock().await.deferral(kind) {
            debug!("{} backing off for {:?}", tag, wait);
            return SyncOutcome::Deferred {
                retry_in_ms: wait.as_millis() as u64,
            };
        }

        let outcome = match kind {
            OperationKind::LocationUpdate => self.sync_location_batch().await,
            _ => self.sync_in_order(kind).await,
        };

        match &outcome {
            SyncOutcome::Completed { replayed } if *replayed > 0 => {
                info!("{}: replayed {} operations", tag, replayed)
            }
            SyncOutcome::Stalled {
                replayed,
                remaining,
                error,
            } => warn!(
                "{}: stalled after {} replays, {} still queued: {}",
                tag, replayed, remaining, error
            ),
            _ => debug!("{}: {:?}", tag, outcome),
        }
        outcome
    }

    /// Triggers every tag concurrently; kinds never wait on each other.
    pub async fn trigger_all(&self) -> Vec<(SyncTag, SyncOutcome)> {
        let (location, delivery, photos) = tokio::join!(
            self.trigger(SyncTag::LocationSync),
            self.trigger(SyncTag::DeliverySync),
            self.trigger(SyncTag::PhotosSync),
        );
        vec![
            (SyncTag::LocationSync, location),
            (SyncTag::DeliverySync, delivery),
            (SyncTag::PhotosSync, photos),
        ]
    }

    /// Replays one operation at a time in FIFO order, stopping at the first failure.
    async fn sync_in_order(&self, kind: OperationKind) -> SyncOutcome {
        let mut drain = self.queue.drain(Some(kind));
        let mut replayed = 0;

        while let Some(op) = drain.next().await {
            let result = match self.request_for(&op) {
                Ok(request) => self.send(&request).await,
                Err(reason) => Err(reason),
            };

            if let Err(reason) = result {
                self.record_failure(kind, std::slice::from_ref(&op), &reason).await;
                return self.stalled(kind, replayed, reason).await;
            }

            if let Err(err) = self.queue.remove(op.id).await {
                error!("#{} was replayed but could not be removed: {}", op.id, err);
                return self.stalled(kind, replayed, err.to_string()).await;
            }
            self.ledger.lock().await.record_success(kind, op.id);
            replayed += 1;
        }

        SyncOutcome::Completed { replayed }
    }

    /// Sends every pending location in a single POST.
    async fn sync_location_batch(&self) -> SyncOutcome {
        let kind = OperationKind::LocationUpdate;
        let batch = self.queue.drain(Some(kind)).collect().await;
        if batch.is_empty() {
            return SyncOutcome::Completed { replayed: 0 };
        }

        let locations: Vec<Value> = batch.iter().map(location_entry).collect();
        let ids = batch
            .iter()
            .map(|op| op.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut request = FetchRequest::post_json(
            self.endpoints.location_batch.clone(),
            &json!({ "locations": locations }),
        );
        if let Ok(value) = HeaderValue::from_str(&ids) {
            request = request.with_header(HeaderName::from_static(OPERATION_ID_HEADER), value);
        }

        if let Err(reason) = self.send(&request).await {
            self.record_failure(kind, &batch, &reason).await;
            return self.stalled(kind, 0, reason).await;
        }

        for op in &batch {
            if let Err(err) = self.queue.remove(op.id).await {
                error!("Location #{} was sent but could not be removed: {}", op.id, err);
            }
        }
        let mut ledger = self.ledger.lock().await;
        for op in &batch {
            ledger.record_success(kind, op.id);
        }
        SyncOutcome::Completed {
            replayed: batch.len(),
        }
    }

    fn request_for(&self, op: &PendingOperation) -> Result<FetchRequest, String> {
        let template = match op.kind {
            OperationKind::LocationUpdate => &self.endpoints.location_batch,
            OperationKind::DeliveryUpdate => &self.endpoints.delivery_status,
            OperationKind::PhotoUpload => &self.endpoints.photo_upload,
        };
        let url = match &op.resource_id {
            Some(id) => template.replace("{id}", id),
            None if template.contains("{id}") => {
                return Err(format!("#{} has no resource id for {}", op.id, template))
            }
            None => template.clone(),
        };

        let request = match &op.payload {
            Payload::Json { value } => FetchRequest::post_json(url, value),
            Payload::Blob {
                content_type,
                file_name,
                data,
            } => {
                let content_type = HeaderValue::from_str(content_type)
                    .map_err(|e| format!("#{} content type: {}", op.id, e))?;
                let mut request = FetchRequest::new(Method::POST, url)
                    .with_header(header::CONTENT_TYPE, content_type)
                    .with_body(data.clone());
                if let Some(value) = file_name.as_deref().and_then(|n| HeaderValue::from_str(n).ok()) {
                    request = request.with_header(HeaderName::from_static("x-file-name"), value);
                }
                request
            }
        };

        Ok(request.with_header(
            HeaderName::from_static(OPERATION_ID_HEADER),
            HeaderValue::from(op.id),
        ))
    }

    async fn send(&self, request: &FetchRequest) -> Result<(), String> {
        match self.network.fetch(request).await {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(format!("{} {} answered {}", request.method, request.url, response.status)),
            Err(err) => Err(err.to_string()),
        }
    }

    /// Counts a failure against the head operation and dead-letters the
    /// failed operations once the policy is exhausted.
    async fn record_failure(&self, kind: OperationKind, failed: &[PendingOperation], reason: &str) {
        let Some(head) = failed.first() else {
            return;
        };
        let attempts = self
            .ledger
            .lock()
            .await
            .record_failure(kind, head.id, &self.policy);
        warn!("{} #{} failed (attempt {}): {}", kind, head.id, attempts, reason);

        if !self.policy.is_exhausted(attempts) {
            return;
        }
        let mut moved = Vec::with_capacity(failed.len());
        for op in failed {
            match self.queue.dead_letter(op.id, attempts, reason).await {
                Ok(_) => moved.push(op.id),
                Err(err) => error!("Could not dead-letter #{}: {}", op.id, err),
            }
        }
        let mut ledger = self.ledger.lock().await;
        for id in moved {
            ledger.forget(id);
        }
    }

    /// Drops retry bookkeeping for an operation removed outside a replay.
    pub async fn forget(&self, id: u64) {
        self.ledger.lock().await.forget(id);
    }

    async fn stalled(&self, kind: OperationKind, replayed: usize, error: String) -> SyncOutcome {
        SyncOutcome::Stalled {
            replayed,
            remaining: self.queue.snapshot(Some(kind)).await.len(),
            error,
        }
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

/// Location payload with the queue timestamp filled in when missing.
fn location_entry(op: &PendingOperation) -> Value {
    let mut entry = match &op.payload {
        Payload::Json { value } => value.clone(),
        Payload::Blob { .. } => Value::Null,
    };
    if let Value::Object(map) = &mut entry {
        map.entry("timestamp")
            .or_insert_with(|| Value::String(op.created_at.to_rfc3339()));
    }
    entry
}
