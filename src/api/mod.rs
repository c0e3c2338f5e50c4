//! API Module
//!
//! The intercepting proxy plus the `/_sw` control endpoints.
//!
//! # Endpoints
//! - `POST /_sw/queue` - Enqueue a pending operation
//! - `GET /_sw/queue` - List pending operations
//! - `DELETE /_sw/queue/:id` - Remove a pending operation
//! - `GET /_sw/dead-letters` - List dead-lettered operations
//! - `POST /_sw/dead-letters/:id/requeue` - Put a dead letter back in the queue
//! - `DELETE /_sw/dead-letters/:id` - Discard a dead letter
//! - `POST /_sw/sync/:tag` - Trigger a sync tag
//! - `POST /_sw/activate/:version` - Install and activate a cache version
//! - `POST /_sw/push` - Build a notification from a push payload
//! - `POST /_sw/notification-click` - Resolve a notification click
//! - `GET /_sw/stats` - Cache and queue statistics
//! - `GET /_sw/health` - Health check endpoint
//! - anything else - proxied through the interceptor

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
