//! Request and Response models for the control API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing `/_sw` request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{BlobUpload, EnqueueRequest, NotificationClickRequest};
pub use responses::{
    ActivateResponse, ClickResponse, DeadLettersResponse, EnqueueResponse, HealthResponse,
    QueueResponse, RemoveResponse, StatsResponse, SyncResponse,
};
