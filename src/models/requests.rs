//! Request DTOs for the control API
//!
//! Defines the structure of incoming `/_sw` request bodies.

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::Value;

use crate::push::ClientWindow;
use crate::queue::{NewOperation, OperationKind, Payload};

/// Binary part of an enqueue request, base64 encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobUpload {
    pub content_type: String,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Base64 (standard alphabet) file contents
    pub data: String,
}

/// Request body for `POST /_sw/queue`
///
/// Either `payload` (any JSON) or `blob` carries the operation body.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRequest {
    pub kind: OperationKind,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub blob: Option<BlobUpload>,
}

impl EnqueueRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match (&self.payload, &self.blob) {
            (Some(_), Some(_)) => Some("Provide either payload or blob, not both".to_string()),
            (None, None) => Some("Missing payload or blob".to_string()),
            _ => None,
        }
    }

    /// Converts the request into a queue operation.
    pub fn into_operation(self) -> Result<NewOperation, String> {
        if let Some(message) = self.validate() {
            return Err(message);
        }

        let payload = match (self.payload, self.blob) {
            (Some(value), None) => Payload::json(value),
            (None, Some(blob)) => Payload::Blob {
                data: general_purpose::STANDARD
                    .decode(blob.data.as_bytes())
                    .map_err(|e| format!("Blob data is not valid base64: {}", e))?,
                content_type: blob.content_type,
                file_name: blob.file_name,
            },
            _ => return Err("Missing payload or blob".to_string()),
        };

        Ok(NewOperation {
            kind: self.kind,
            payload,
            resource_id: self.resource_id,
        })
    }
}

/// Request body for `POST /_sw/notification-click`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationClickRequest {
    #[serde(default)]
    pub action: Option<String>,
    /// Notification data; `data.url` is the click target
    #[serde(default)]
    pub data: Value,
    /// Windows currently open in the hosting runtime
    #[serde(default)]
    pub clients: Vec<ClientWindow>,
}
