//! API Handlers
//!
//! HTTP handlers for the intercepting proxy and the `/_sw` control endpoints.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::cache::CacheVersion;
use crate::error::{OfflineError, Result};
use crate::fetch::{FetchRequest, FetchResponse};
use crate::models::{
    ActivateResponse, ClickResponse, DeadLettersResponse, EnqueueRequest, EnqueueResponse,
    HealthResponse, NotificationClickRequest, QueueResponse, RemoveResponse, StatsResponse,
    SyncResponse,
};
use crate::push::Notification;
use crate::queue::{OperationKind, SyncTag};
use crate::sync::SyncOutcome;
use crate::worker::{OfflineWorker, WorkerHooks};

/// Header telling the client where a proxied response came from.
pub const SOURCE_HEADER: &str = "x-offline-source";

/// Largest request body the proxy buffers.
const MAX_PROXY_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Connection-scoped headers that must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<OfflineWorker>,
}

impl AppState {
    pub fn new(worker: OfflineWorker) -> Self {
        Self {
            worker: Arc::new(worker),
        }
    }
}

impl From<Arc<OfflineWorker>> for AppState {
    fn from(worker: Arc<OfflineWorker>) -> Self {
        Self { worker }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Fallback handler: every request outside `/_sw` goes through the interceptor.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_PROXY_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            return OfflineError::QuotaExceeded(format!("request body: {}", err)).into_response()
        }
    };

    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);

    let fetch = FetchRequest {
        method: parts.method,
        url,
        headers,
        body,
    };

    match state.worker.on_intercept(&fetch).await {
        Ok(response) => into_http_response(response),
        Err(err) => {
            debug!("{} {} failed upstream: {}", fetch.method, fetch.url, err);
            OfflineError::Upstream(err.to_string()).into_response()
        }
    }
}

fn into_http_response(fetched: FetchResponse) -> Response {
    let source = fetched.source;
    let mut response = Response::new(Body::from(fetched.body));
    *response.status_mut() = fetched.status;

    let mut headers = fetched.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::CONTENT_LENGTH);
    headers.insert(
        HeaderName::from_static(SOURCE_HEADER),
        HeaderValue::from_static(source.as_str()),
    );
    *response.headers_mut() = headers;
    response
}

/// Handler for POST /_sw/queue
pub async fn enqueue_handler(
    State(state): State<AppState>,
    Json(req): Json<EnqueueRequest>,
) -> Result<(StatusCode, Json<EnqueueResponse>)> {
    let op = req.into_operation().map_err(OfflineError::InvalidRequest)?;
    let pending = state.worker.enqueue(op).await?;
    Ok((StatusCode::CREATED, Json(EnqueueResponse::new(pending))))
}

#[derive(Debug, Default, Deserialize)]
pub struct QueueFilter {
    pub kind: Option<OperationKind>,
}

/// Handler for GET /_sw/queue
pub async fn list_queue_handler(
    State(state): State<AppState>,
    Query(filter): Query<QueueFilter>,
) -> Json<QueueResponse> {
    Json(QueueResponse::new(state.worker.queue().snapshot(filter.kind).await))
}

/// Handler for DELETE /_sw/queue/:id
///
/// Removing an id that is already gone still succeeds.
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<RemoveResponse>> {
    let removed = state.worker.remove(id).await?;
    Ok(Json(RemoveResponse { id, removed }))
}

/// Handler for GET /_sw/dead-letters
pub async fn dead_letters_handler(State(state): State<AppState>) -> Json<DeadLettersResponse> {
    Json(DeadLettersResponse::new(state.worker.queue().dead_letters().await))
}

/// Handler for DELETE /_sw/dead-letters/:id
pub async fn discard_dead_letter_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<RemoveResponse>> {
    let removed = state.worker.queue().discard_dead_letter(id).await?;
    Ok(Json(RemoveResponse { id, removed }))
}

/// Handler for POST /_sw/dead-letters/:id/requeue
pub async fn requeue_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<(StatusCode, Json<EnqueueResponse>)> {
    let pending = state.worker.queue().requeue_dead_letter(id).await?;
    Ok((StatusCode::CREATED, Json(EnqueueResponse::new(pending))))
}

/// Handler for POST /_sw/sync/:tag
pub async fn sync_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<(StatusCode, Json<SyncResponse>)> {
    let tag: SyncTag = tag.parse()?;
    let outcome = state.worker.on_sync_trigger(tag).await;
    let status = match outcome {
        SyncOutcome::AlreadyRunning => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };
    Ok((status, Json(SyncResponse { tag, outcome })))
}

/// Handler for POST /_sw/activate/:version
///
/// Installs the version (precache) and activates it in one step.
pub async fn activate_handler(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> Result<Json<ActivateResponse>> {
    let version = CacheVersion::new(version)?;
    let report = state.worker.on_install(&version).await;
    let removed = state.worker.on_activate(&version).await;

    Ok(Json(ActivateResponse {
        version: version.to_string(),
        precached: report.stored,
        precache_failed: report.failed,
        removed_partitions: removed.iter().map(ToString::to_string).collect(),
    }))
}

/// Handler for POST /_sw/push
pub async fn push_handler(State(state): State<AppState>, body: Bytes) -> Json<Notification> {
    Json(state.worker.on_push_received(&body).await)
}

/// Handler for POST /_sw/notification-click
pub async fn notification_click_handler(
    State(state): State<AppState>,
    Json(req): Json<NotificationClickRequest>,
) -> Json<ClickResponse> {
    let outcome = state
        .worker
        .on_notification_click(req.action.as_deref(), &req.data, &req.clients);
    Json(ClickResponse { outcome })
}

/// Handler for GET /_sw/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let worker = &state.worker;
    let cache = worker.cache_stats().await;

    Json(StatsResponse {
        hit_rate: cache.hit_rate(),
        cache,
        cache_version: worker.cache_version().await.map(|v| v.to_string()),
        partitions: worker.partition_names().await,
        queue: worker.queue_stats().await,
        link: worker.connectivity().state(),
    })
}

/// Handler for GET /_sw/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
