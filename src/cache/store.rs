//! Concurrent cache store.
//!
//! A key/value repository of cached entries with no policy knowledge:
//! freshness and reuse checks happen in `cache::freshness` and
//! `cache::policy`. Reads proceed in parallel; a write is exclusive with
//! all reads and other writes at whole-store granularity. There is no
//! eviction and no request coalescing: two concurrent misses for the same
//! slot both fetch from origin and the later `set` wins.
//!
//! The lock is only ever held for the in-memory map access, never across
//! an origin fetch or any other I/O.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::entry::CachedResponse;

/// Snapshot of store activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub entries: u64,
}

/// Statistics tracker using atomics for thread safety
struct CacheStatsTracker {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl CacheStatsTracker {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_store(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, entries: u64) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// Concurrent map from store slot (base cache key) to cached entry.
///
/// Entries are exclusively owned by the store once inserted; readers get
/// an `Arc` handle to the stored value without copying the body. An entry
/// is only ever replaced wholesale by a later `set` under the same slot.
pub struct CacheStore {
    entries: RwLock<HashMap<String, Arc<CachedResponse>>>,
    stats: CacheStatsTracker,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: CacheStatsTracker::new(),
        }
    }

    /// Fetch the entry stored under a slot, counting hit/miss.
    pub fn get(&self, slot: &str) -> Option<Arc<CachedResponse>> {
        let found = self.entries.read().get(slot).cloned();
        match found {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Insert an entry under its slot, replacing any previous entry.
    pub fn set(&self, entry: CachedResponse) {
        let slot = entry.key.slot().to_string();
        self.entries.write().insert(slot, Arc::new(entry));
        self.stats.record_store();
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of activity counters and entry count.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len() as u64)
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
