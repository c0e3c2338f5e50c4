//! Recency Tracker Module
//!
//! Least-recently-used ordering for one partition's keys.

use std::collections::{BTreeMap, HashMap};

use super::entry::RequestKey;

// == Recency Tracker ==
/// Orders keys by a monotonically increasing access tick.
///
/// The smallest tick is the least recently used key.
#[derive(Debug, Default)]
pub struct RecencyTracker {
    tick: u64,
    by_tick: BTreeMap<u64, RequestKey>,
    ticks: HashMap<RequestKey, u64>,
}

impl RecencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &RequestKey) {
        self.tick += 1;
        if let Some(old) = self.ticks.insert(key.clone(), self.tick) {
            self.by_tick.remove(&old);
        }
        self.by_tick.insert(self.tick, key.clone());
    }

    pub fn remove(&mut self, key: &RequestKey) {
        if let Some(old) = self.ticks.remove(key) {
            self.by_tick.remove(&old);
        }
    }

    /// Returns and forgets the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<RequestKey> {
        let (_, key) = self.by_tick.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }
}
