//! Error types for the offline cache and sync engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Offline Error Enum ==
/// Unified error type for the cache store, the pending queue and the control API.
#[derive(Error, Debug)]
pub enum OfflineError {
    /// Referenced item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Pending-operation queue reached its capacity
    #[error("Queue full: {0}")]
    QueueFull(String),

    /// Cache entry rejected because it exceeds the storage quota
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Persisted state could not be read back
    #[error("Storage corrupted: {0}")]
    Corrupted(String),

    /// Underlying filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream request failed and no offline substitute applies
    #[error("Upstream unreachable: {0}")]
    Upstream(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for OfflineError {
    fn into_response(self) -> Response {
        let status = match &self {
            OfflineError::NotFound(_) => StatusCode::NOT_FOUND,
            OfflineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            OfflineError::QueueFull(_) => StatusCode::INSUFFICIENT_STORAGE,
            OfflineError::QuotaExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
            OfflineError::Corrupted(_) | OfflineError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            OfflineError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, OfflineError>;
