//! Pending operations and the sync tags that select them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OfflineError;

// == Operation Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    LocationUpdate,
    DeliveryUpdate,
    PhotoUpload,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::LocationUpdate,
        OperationKind::DeliveryUpdate,
        OperationKind::PhotoUpload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::LocationUpdate => "location-update",
            OperationKind::DeliveryUpdate => "delivery-update",
            OperationKind::PhotoUpload => "photo-upload",
        }
    }

    pub fn sync_tag(&self) -> SyncTag {
        match self {
            OperationKind::LocationUpdate => SyncTag::LocationSync,
            OperationKind::DeliveryUpdate => SyncTag::DeliverySync,
            OperationKind::PhotoUpload => SyncTag::PhotosSync,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Sync Tag ==
/// Well-known trigger tag; each one drains exactly one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncTag {
    LocationSync,
    DeliverySync,
    PhotosSync,
}

impl SyncTag {
    pub const ALL: [SyncTag; 3] = [SyncTag::LocationSync, SyncTag::DeliverySync, SyncTag::PhotosSync];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTag::LocationSync => "location-sync",
            SyncTag::DeliverySync => "delivery-sync",
            SyncTag::PhotosSync => "photos-sync",
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            SyncTag::LocationSync => OperationKind::LocationUpdate,
            SyncTag::DeliverySync => OperationKind::DeliveryUpdate,
            SyncTag::PhotosSync => OperationKind::PhotoUpload,
        }
    }
}

impl fmt::Display for SyncTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncTag {
    type Err = OfflineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| OfflineError::InvalidRequest(format!("unknown sync tag '{}'", s)))
    }
}

// == Payload ==
/// Body replayed to the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Json {
        value: Value,
    },
    /// Binary upload (photo); base64 in the journal
    Blob {
        content_type: String,
        #[serde(default)]
        file_name: Option<String>,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
}

impl Payload {
    pub fn json(value: Value) -> Self {
        Payload::Json { value }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            Payload::Json { value } => value.to_string().len(),
            Payload::Blob { data, .. } => data.len(),
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

// == New Operation ==
/// A mutation submitted by application code, not yet sequenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOperation {
    pub kind: OperationKind,
    pub payload: Payload,
    /// Target resource, e.g. a delivery-point id
    #[serde(default)]
    pub resource_id: Option<String>,
}

impl NewOperation {
    pub fn new(kind: OperationKind, payload: Payload) -> Self {
        Self {
            kind,
            payload,
            resource_id: None,
        }
    }

    pub fn for_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Rejects operations that could never be replayed.
    ///
    /// Location updates are batched as JSON; delivery updates and photos
    /// address a delivery point and need its id.
    pub fn validate(&self) -> Result<(), OfflineError> {
        let has_resource = self
            .resource_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());

        match (self.kind, &self.payload) {
            (OperationKind::LocationUpdate, Payload::Blob { .. }) => Err(
                OfflineError::InvalidRequest("location updates must carry JSON".into()),
            ),
            (OperationKind::DeliveryUpdate, Payload::Blob { .. }) => Err(
                OfflineError::InvalidRequest("delivery updates must carry JSON".into()),
            ),
            (OperationKind::DeliveryUpdate | OperationKind::PhotoUpload, _) if !has_resource => {
                Err(OfflineError::InvalidRequest(format!(
                    "{} requires a resource_id",
                    self.kind
                )))
            }
            _ => Ok(()),
        }
    }
}

// == Pending Operation ==
/// A queued mutation. Immutable once created; only ever removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Sequence number; also the operation's identity
    pub id: u64,
    pub kind: OperationKind,
    pub payload: Payload,
    pub resource_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// == Dead Letter ==
/// An operation withdrawn from the queue after exhausting its retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub operation: PendingOperation,
    pub attempts: u32,
    pub last_error: String,
    pub failed_at: DateTime<Utc>,
}
