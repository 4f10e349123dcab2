//! In-memory TTL cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Default entry target before an insert triggers an expiry sweep.
pub const DEFAULT_MAX_ENTRIES: usize = 300;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Key/value store with per-entry expiry.
///
/// Expired entries are removed lazily on read, and in bulk when an insert
/// finds the store at capacity. The capacity is a soft target: if nothing
/// has expired, the insert still succeeds and the store grows past it.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the given soft capacity.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a live value, removing it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert a value that expires after `ttl`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.lock();

        if entries.len() >= self.max_entries {
            let before = entries.len();
            entries.retain(|_, e| e.expires_at > now);
            debug!(purged = before - entries.len(), remaining = entries.len(), "Cache sweep");
        }

        entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Current number of stored entries, including not-yet-evicted expired ones.
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    /// Soft capacity.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
