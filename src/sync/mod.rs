//! Sync Module
//!
//! Background replay of queued operations once connectivity returns.

mod coordinator;
mod retry;

pub use coordinator::{SyncCoordinator, SyncEndpoints, SyncOutcome, OPERATION_ID_HEADER};
pub use retry::RetryPolicy;
