//! Configuration Module
//!
//! Handles loading and managing worker configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_ENTRY_BYTES};
use crate::queue::DEFAULT_MAX_PENDING;
use crate::sync::RetryPolicy;

/// Worker configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Origin that intercepted requests and replays are sent to
    pub origin_url: String,
    /// Cache version activated at startup
    pub cache_version: String,
    /// Maximum entries per cache partition
    pub max_entries_per_partition: usize,
    /// Largest response body that will be cached
    pub max_entry_bytes: usize,
    /// Queue journal location; `None` keeps the queue in memory
    pub queue_path: Option<PathBuf>,
    /// Maximum number of pending operations
    pub max_pending_operations: usize,
    /// Periodic sync interval in seconds
    pub sync_interval: u64,
    /// Per-request network timeout in milliseconds
    pub network_timeout_ms: u64,
    /// Failures before an operation is dead-lettered; `None` retries forever
    pub sync_max_attempts: Option<u32>,
    /// Pause after a failed sync cycle in milliseconds
    pub sync_backoff_ms: u64,
    /// URLs fetched into the static partition on install
    pub precache_urls: Vec<String>,
    /// Page served to offline navigations
    pub offline_page: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `ORIGIN_URL` - Origin base URL (default: http://127.0.0.1:8000)
    /// - `CACHE_VERSION` - Cache version tag (default: v1)
    /// - `MAX_ENTRIES_PER_PARTITION` - Entries per partition (default: 500)
    /// - `MAX_ENTRY_BYTES` - Largest cacheable body (default: 5 MiB)
    /// - `QUEUE_PATH` - Queue journal file (default: in-memory)
    /// - `MAX_PENDING_OPERATIONS` - Queue capacity (default: 1000)
    /// - `SYNC_INTERVAL` - Periodic sync in seconds (default: 30)
    /// - `NETWORK_TIMEOUT_MS` - Network timeout (default: 10000)
    /// - `SYNC_MAX_ATTEMPTS` - Dead-letter threshold (default: unbounded)
    /// - `SYNC_BACKOFF_MS` - Backoff after a failed cycle (default: 0)
    /// - `PRECACHE_URLS` - Comma-separated install list
    /// - `OFFLINE_PAGE` - Offline fallback page (default: /offline.html)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("SERVER_PORT").unwrap_or(defaults.server_port),
            origin_url: non_empty("ORIGIN_URL").unwrap_or(defaults.origin_url),
            cache_version: non_empty("CACHE_VERSION").unwrap_or(defaults.cache_version),
            max_entries_per_partition: parsed("MAX_ENTRIES_PER_PARTITION")
                .unwrap_or(defaults.max_entries_per_partition),
            max_entry_bytes: parsed("MAX_ENTRY_BYTES").unwrap_or(defaults.max_entry_bytes),
            queue_path: non_empty("QUEUE_PATH").map(PathBuf::from),
            max_pending_operations: parsed("MAX_PENDING_OPERATIONS")
                .unwrap_or(defaults.max_pending_operations),
            sync_interval: parsed("SYNC_INTERVAL").unwrap_or(defaults.sync_interval),
            network_timeout_ms: parsed("NETWORK_TIMEOUT_MS").unwrap_or(defaults.network_timeout_ms),
            sync_max_attempts: parsed("SYNC_MAX_ATTEMPTS"),
            sync_backoff_ms: parsed("SYNC_BACKOFF_MS").unwrap_or(defaults.sync_backoff_ms),
            precache_urls: non_empty("PRECACHE_URLS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.precache_urls),
            offline_page: non_empty("OFFLINE_PAGE").unwrap_or(defaults.offline_page),
        }
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self.sync_max_attempts {
            Some(max) => RetryPolicy::bounded(max, Duration::from_millis(self.sync_backoff_ms)),
            None => RetryPolicy {
                max_attempts: None,
                backoff: Duration::from_millis(self.sync_backoff_ms),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            origin_url: "http://127.0.0.1:8000".to_string(),
            cache_version: "v1".to_string(),
            max_entries_per_partition: DEFAULT_MAX_ENTRIES,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
            queue_path: None,
            max_pending_operations: DEFAULT_MAX_PENDING,
            sync_interval: 30,
            network_timeout_ms: 10_000,
            sync_max_attempts: None,
            sync_backoff_ms: 0,
            precache_urls: split_list("/,/offline.html,/manifest.json"),
            offline_page: "/offline.html".to_string(),
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
