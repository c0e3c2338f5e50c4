//! Offline Sync - An offline request cache and background sync coordinator
//!
//! Serves requests from versioned cache partitions when the origin is
//! unreachable and replays queued mutations once it comes back.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod intercept;
pub mod models;
pub mod push;
pub mod queue;
pub mod strategy;
pub mod sync;
pub mod tasks;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_reconnect_task, spawn_sync_task};
pub use worker::{OfflineWorker, WorkerHooks};
