//! Internal storage for the page cache.
//!
//! Entries live in an `IndexMap` behind a read-write lock. The lock is only
//! ever held for the duration of a map operation, never across an await.

use indexmap::IndexMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::Instant;

use crate::entry::Entry;
use crate::stats::CacheStats;

/// Thread-safe key to entry map.
///
/// This is the internal implementation; users should use `PageCache` instead.
#[derive(Debug)]
pub struct Store<T> {
    /// Insertion order is kept so `keys()` lists entries oldest first.
    entries: RwLock<IndexMap<String, Entry<T>>>,

    /// Statistics shared with the owning cache.
    stats: Arc<CacheStats>,
}

impl<T: Clone> Store<T> {
    pub fn new(stats: Arc<CacheStats>) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            stats,
        }
    }

    /// Return the value for `key` if its entry is fresh at `now`.
    ///
    /// Stale entries are left in place; they are replaced by the next store.
    pub fn get_fresh(&self, key: &str, now: Instant) -> Option<T> {
        let entries = self.read_lock()?;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .map(|entry| entry.value().clone())
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&self, key: String, entry: Entry<T>) {
        let mut entries = match self.write_lock() {
            Some(e) => e,
            None => return,
        };

        // Replacing keeps the key's original position.
        entries.insert(key, entry);
        self.stats.set_size(entries.len() as u64);
    }

    /// Remove the entry for `key`, fresh or not.
    ///
    /// Returns `true` if an entry existed.
    pub fn remove(&self, key: &str) -> bool {
        let mut entries = match self.write_lock() {
            Some(e) => e,
            None => return false,
        };

        let existed = entries.shift_remove(key).is_some();
        self.stats.set_size(entries.len() as u64);
        existed
    }

    /// Check for a fresh entry without cloning its value.
    pub fn contains_fresh(&self, key: &str, now: Instant) -> bool {
        match self.read_lock() {
            Some(entries) => entries.get(key).is_some_and(|e| e.is_fresh_at(now)),
            None => false,
        }
    }

    /// Expiry of the entry for `key`, fresh or not.
    pub fn expires_at(&self, key: &str) -> Option<Instant> {
        let entries = self.read_lock()?;
        entries.get(key).map(|entry| entry.expires_at())
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        match self.read_lock() {
            Some(entries) => entries.len(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys, oldest first.
    pub fn keys(&self) -> Vec<String> {
        match self.read_lock() {
            Some(entries) => entries.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn clear(&self) {
        if let Some(mut entries) = self.write_lock() {
            entries.clear();
            self.stats.set_size(0);
        }
    }

    /// Drop every entry that is stale at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_stale(&self, now: Instant) -> usize {
        let mut entries = match self.write_lock() {
            Some(e) => e,
            None => return 0,
        };

        let initial_len = entries.len();
        entries.retain(|_, entry| entry.is_fresh_at(now));
        self.stats.set_size(entries.len() as u64);

        initial_len - entries.len()
    }

    /// Acquire a read lock, returning None if poisoned.
    fn read_lock(&self) -> Option<RwLockReadGuard<'_, IndexMap<String, Entry<T>>>> {
        self.entries.read().ok()
    }

    /// Acquire a write lock, returning None if poisoned.
    fn write_lock(&self) -> Option<RwLockWriteGuard<'_, IndexMap<String, Entry<T>>>> {
        self.entries.write().ok()
    }
}
