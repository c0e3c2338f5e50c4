//! Response DTOs for the control API
//!
//! Defines the structure of outgoing `/_sw` response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::fetch::LinkState;
use crate::push::ClickOutcome;
use crate::queue::{DeadLetter, PendingOperation, SyncTag};
use crate::sync::SyncOutcome;
use crate::worker::QueueStats;

/// Response body for `POST /_sw/queue`
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueResponse {
    pub message: String,
    pub operation: PendingOperation,
}

impl EnqueueResponse {
    pub fn new(operation: PendingOperation) -> Self {
        Self {
            message: format!("Operation #{} queued", operation.id),
            operation,
        }
    }
}

/// Response body for `GET /_sw/queue`
#[derive(Debug, Clone, Serialize)]
pub struct QueueResponse {
    pub count: usize,
    pub operations: Vec<PendingOperation>,
}

impl QueueResponse {
    pub fn new(operations: Vec<PendingOperation>) -> Self {
        Self {
            count: operations.len(),
            operations,
        }
    }
}

/// Response body for `DELETE /_sw/queue/:id`
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    pub id: u64,
    /// False when the id was already gone
    pub removed: bool,
}

/// Response body for `GET /_sw/dead-letters`
#[derive(Debug, Clone, Serialize)]
pub struct DeadLettersResponse {
    pub count: usize,
    pub dead_letters: Vec<DeadLetter>,
}

impl DeadLettersResponse {
    pub fn new(dead_letters: Vec<DeadLetter>) -> Self {
        Self {
            count: dead_letters.len(),
            dead_letters,
        }
    }
}

/// Response body for `POST /_sw/sync/:tag`
#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    pub tag: SyncTag,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

/// Response body for `POST /_sw/activate/:version`
#[derive(Debug, Clone, Serialize)]
pub struct ActivateResponse {
    pub version: String,
    pub precached: Vec<String>,
    pub precache_failed: Vec<String>,
    pub removed_partitions: Vec<String>,
}

/// Response body for `POST /_sw/notification-click`
#[derive(Debug, Clone, Serialize)]
pub struct ClickResponse {
    #[serde(flatten)]
    pub outcome: ClickOutcome,
}

/// Response body for `GET /_sw/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub cache_version: Option<String>,
    pub partitions: Vec<String>,
    pub queue: QueueStats,
    pub link: LinkState,
}

/// Response body for `GET /_sw/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
