//! Cache Module
//!
//! Versioned response partitions keyed on normalized request identity.

mod entry;
mod lru;
mod partition;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, RequestKey};
pub use lru::RecencyTracker;
pub use partition::{CacheVersion, PartitionName, PartitionRole};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default number of entries per partition
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Default size limit of a single entry
pub const DEFAULT_MAX_ENTRY_BYTES: usize = 5 * 1024 * 1024; // 5 MB
