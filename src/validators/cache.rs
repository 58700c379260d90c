//! Memoizing cache shared by the action validators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::model::Task;

const MAX_ENTRIES: usize = 1024;

/// Builds a cache key that embeds the task's modification stamp.
///
/// Any mutation that bumps `last_modified_at` produces new keys, so stale
/// answers are never read back.
#[must_use]
pub fn cache_key(prefix: &str, task: &Task, extra: &[&str]) -> String {
    let mut key = format!("{prefix}:{}:{}", task.id, task.last_modified_at.timestamp_millis());
    for part in extra {
        key.push(':');
        key.push_str(part);
    }
    key
}

/// A string-keyed memo table with hit/miss counters.
#[derive(Debug)]
pub struct MemoCache<V> {
    entries: Mutex<HashMap<String, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<V: Clone> MemoCache<V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs without the lock held, so it may consult other caches
    /// or this one.
    pub fn get_or_compute(&self, key: String, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return value.clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "validator cache miss");
        let value = compute();
        let mut entries = self.lock();
        if entries.len() >= MAX_ENTRIES {
            entries.clear();
        }
        entries.insert(key, value.clone());
        value
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of lookups that had to compute.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
