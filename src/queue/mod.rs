//! Queue Module
//!
//! Durable FIFO of mutations recorded while the origin was unreachable.

mod journal;
mod operation;
mod store;


pub use journal::{Journal, JournalSnapshot};
pub use operation::{
    DeadLetter, NewOperation, OperationKind, Payload, PendingOperation, SyncTag,
};
pub use store::{Drain, PendingQueue};

/// Default maximum number of pending operations
pub const DEFAULT_MAX_PENDING: usize = 1000;
