//! Cache Statistics Module
//!
//! Tracks lookups, writes, evictions and offline fallbacks.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries committed
    pub writes: u64,
    /// Writes ignored because the request was not a GET or the response not 2xx
    pub skipped_writes: u64,
    /// Entries evicted because a partition reached capacity
    pub evictions: u64,
    /// Responses synthesized because neither network nor cache could answer
    pub offline_fallbacks: u64,
    /// Entries across active partitions
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_skipped_write(&mut self) {
        self.skipped_writes += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_offline_fallback(&mut self) {
        self.offline_fallbacks += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
