//! Lineage-keyed reuse cache.
//!
//! Maps lineage ids to previously computed values. A probe only hits when
//! the stored key is structurally equivalent to the probed item, so an id
//! collision degrades to a miss instead of returning a wrong value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use mtx_foundation::Value;
use serde::Serialize;
use tracing::{debug, trace};

use crate::lineage::{LineageId, LineageItem};

/// Counters reported by [`ReuseCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries stored.
    pub puts: u64,
    /// Entries refused because the cache was full.
    pub rejected: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

#[derive(Debug)]
struct Entry {
    key: LineageItem,
    value: Value,
}

/// Thread-safe map from lineage to computed values.
///
/// Entries are never evicted. With a capacity set, a full cache stops
/// admitting new entries.
#[derive(Debug, Default)]
pub struct ReuseCache {
    entries: Mutex<IndexMap<LineageId, Entry>>,
    capacity: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    rejected: AtomicU64,
}

impl ReuseCache {
    /// An unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache admitting at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<LineageId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value previously stored for a computation equivalent to `item`.
    pub fn probe(&self, item: &LineageItem) -> Option<Value> {
        let found = self
            .lock()
            .get(&item.id())
            .filter(|entry| entry.key.is_equivalent(item))
            .map(|entry| entry.value.clone());

        match found {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(id = %item.id(), "reuse hit");
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `value` as the result of `item`.
    ///
    /// Returns `false` if the cache is full. An existing entry for an
    /// equivalent item is replaced.
    pub fn put(&self, item: &LineageItem, value: Value) -> bool {
        let mut entries = self.lock();
        let id = item.id();
        let full = self
            .capacity
            .is_some_and(|cap| entries.len() >= cap && !entries.contains_key(&id));
        if full {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            debug!(%id, "reuse cache full; entry not stored");
            return false;
        }
        entries.insert(
            id,
            Entry {
                key: item.clone(),
                value,
            },
        );
        self.puts.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
