//! Background Tasks Module
//!
//! Tasks that trigger sync cycles while the server runs.
//!
//! # Tasks
//! - Periodic sync: triggers every tag at a fixed interval
//! - Reconnect sync: triggers every tag when connectivity returns

mod periodic_sync;
mod reconnect;

pub use periodic_sync::spawn_sync_task;
pub use reconnect::spawn_reconnect_task;
