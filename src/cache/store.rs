//! Cache Store Module
//!
//! Versioned response partitions keyed on request identity, with per-partition
//! LRU capacity and an atomic version activation.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::cache::{
    CacheEntry, CacheStats, CacheVersion, PartitionName, PartitionRole, RecencyTracker,
    RequestKey,
};
use crate::error::{OfflineError, Result};
use crate::fetch::{FetchRequest, FetchResponse};

#[derive(Debug, Default)]
struct Partition {
    entries: HashMap<RequestKey, CacheEntry>,
    recency: RecencyTracker,
}

// == Cache Store ==
/// Response cache made of named `<role>-<version>` partitions.
///
/// Reads and writes always target the active partition of a role. A new
/// version is populated through [`CacheStore::stage`] and
/// [`CacheStore::put_staged`] without readers seeing it, then swapped in by
/// [`CacheStore::activate`].
#[derive(Debug)]
pub struct CacheStore {
    partitions: HashMap<PartitionName, Partition>,
    active: HashMap<PartitionRole, PartitionName>,
    stats: CacheStats,
    /// Maximum entries per partition
    max_entries: usize,
    /// Maximum size of a single entry
    max_entry_bytes: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store whose active partitions carry `version`.
    pub fn new(version: CacheVersion, max_entries: usize, max_entry_bytes: usize) -> Self {
        let mut store = Self {
            partitions: HashMap::new(),
            active: HashMap::new(),
            stats: CacheStats::new(),
            max_entries,
            max_entry_bytes,
        };
        for role in PartitionRole::ALL {
            let name = PartitionName::new(role, &version);
            store.partitions.insert(name.clone(), Partition::default());
            store.active.insert(role, name);
        }
        store
    }

    // == Get ==
    /// Looks up `key` in the active partition of `role`.
    ///
    /// Fails only when the role has no active partition, which means the store
    /// state is inconsistent.
    pub fn get(&mut self, role: PartitionRole, key: &RequestKey) -> Result<Option<CacheEntry>> {
        let name = self.active_name(role)?;
        let partition = self
            .partitions
            .get_mut(&name)
            .ok_or_else(|| OfflineError::Corrupted(format!("partition {} is missing", name)))?;

        match partition.entries.get(key) {
            Some(entry) => {
                let entry = entry.clone();
                partition.recency.touch(key);
                self.stats.record_hit();
                debug!("cache hit {} in {}", key, name);
                Ok(Some(entry))
            }
            None => {
                self.stats.record_miss();
                debug!("cache miss {} in {}", key, name);
                Ok(None)
            }
        }
    }

    // == Put ==
    /// Writes `response` for `request` into the active partition of `role`.
    ///
    /// Returns `Ok(false)` without storing anything for non-GET requests or
    /// non-2xx responses. Fails with `QuotaExceeded` for oversized entries.
    pub fn put(
        &mut self,
        role: PartitionRole,
        request: &FetchRequest,
        response: &FetchResponse,
    ) -> Result<bool> {
        let name = self.active_name(role)?;
        self.write(name, request, response)
    }

    // == Stage ==
    /// Creates empty partitions for `version` without activating them.
    pub fn stage(&mut self, version: &CacheVersion) {
        for role in PartitionRole::ALL {
            self.partitions
                .entry(PartitionName::new(role, version))
                .or_default();
        }
        info!("Staged cache version {}", version);
    }

    /// Writes into a staged (or active) partition of an explicit version.
    pub fn put_staged(
        &mut self,
        role: PartitionRole,
        version: &CacheVersion,
        request: &FetchRequest,
        response: &FetchResponse,
    ) -> Result<bool> {
        let name = PartitionName::new(role, version);
        if !self.partitions.contains_key(&name) {
            return Err(OfflineError::NotFound(format!("partition {}", name)));
        }
        self.write(name, request, response)
    }

    // == Activate ==
    /// Makes `version` the active generation for every role, then deletes all
    /// partitions outside the new active set.
    ///
    /// Returns the names of the deleted partitions.
    pub fn activate(&mut self, version: &CacheVersion) -> Vec<PartitionName> {
        self.stage(version);

        let active_set: HashSet<PartitionName> = PartitionRole::ALL
            .iter()
            .map(|role| PartitionName::new(*role, version))
            .collect();
        for name in &active_set {
            self.active.insert(name.role, name.clone());
        }

        let removed = self.delete_partitions_not_in(&active_set);
        info!(
            "Activated cache version {} ({} stale partitions removed)",
            version,
            removed.len()
        );
        removed
    }

    // == Delete Partitions Not In ==
    /// Removes every partition whose name is not in `keep`.
    ///
    /// A role whose active partition is removed has no active partition left
    /// until the next activation; lookups for it fail as corrupted.
    pub fn delete_partitions_not_in(&mut self, keep: &HashSet<PartitionName>) -> Vec<PartitionName> {
        let mut removed: Vec<PartitionName> = self
            .partitions
            .keys()
            .filter(|name| !keep.contains(*name))
            .cloned()
            .collect();
        // Same order as `partition_names`.
        removed.sort_by_key(ToString::to_string);

        for name in &removed {
            self.partitions.remove(name);
            if self.active.get(&name.role) == Some(name) {
                self.active.remove(&name.role);
            }
            debug!("Deleted partition {}", name);
        }

        self.refresh_total();
        removed
    }

    // == Introspection ==
    /// Active version, if every role shares one.
    pub fn active_version(&self) -> Option<CacheVersion> {
        let mut versions = self.active.values().map(|name| &name.version);
        let first = versions.next()?.clone();
        if versions.all(|v| *v == first) && self.active.len() == PartitionRole::ALL.len() {
            Some(first)
        } else {
            None
        }
    }

    /// All partition names, sorted.
    pub fn partition_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.partitions.keys().map(ToString::to_string).collect();
        names.sort();
        names
    }

    /// Number of entries in the active partition of `role`.
    pub fn len(&self, role: PartitionRole) -> usize {
        self.active
            .get(&role)
            .and_then(|name| self.partitions.get(name))
            .map(|partition| partition.entries.len())
            .unwrap_or(0)
    }

    pub fn record_offline_fallback(&mut self) {
        self.stats.record_offline_fallback();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    fn active_name(&self, role: PartitionRole) -> Result<PartitionName> {
        self.active
            .get(&role)
            .cloned()
            .ok_or_else(|| OfflineError::Corrupted(format!("no active {} partition", role)))
    }

    fn write(
        &mut self,
        name: PartitionName,
        request: &FetchRequest,
        response: &FetchResponse,
    ) -> Result<bool> {
        if !request.is_get() || !response.is_success() {
            self.stats.record_skipped_write();
            return Ok(false);
        }

        let key = RequestKey::for_request(request);
        let entry = CacheEntry::from_response(key.clone(), response);
        if entry.size_bytes() > self.max_entry_bytes {
            return Err(OfflineError::QuotaExceeded(format!(
                "{} is {} bytes, limit {}",
                key,
                entry.size_bytes(),
                self.max_entry_bytes
            )));
        }

        let partition = self
            .partitions
            .get_mut(&name)
            .ok_or_else(|| OfflineError::Corrupted(format!("partition {} is missing", name)))?;

        if !partition.entries.contains_key(&key) && partition.entries.len() >= self.max_entries {
            if let Some(evicted) = partition.recency.evict_oldest() {
                partition.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!("Evicted {} from {}", evicted, name);
            }
        }

        partition.entries.insert(key.clone(), entry);
        partition.recency.touch(&key);
        self.stats.record_write();
        self.refresh_total();
        Ok(true)
    }

    fn refresh_total(&mut self) {
        let total = self
            .active
            .values()
            .filter_map(|name| self.partitions.get(name))
            .map(|partition| partition.entries.len())
            .sum();
        self.stats.set_total_entries(total);
    }
}
