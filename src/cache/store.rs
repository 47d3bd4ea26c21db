//! Cache Store Module
//!
//! Bounded response cache combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, LruTracker, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::CacheError;

// == Cache Store ==
/// Response cache storage with LRU eviction and TTL support.
///
/// Not synchronized; share it through [`crate::cache::LocalCache`].
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `max_entries` (minimum 1) entries.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            default_ttl,
        }
    }

    // == Set ==
    /// Stores a payload under `key`.
    ///
    /// An existing entry for the key is overwritten and its timestamp reset.
    /// At capacity, the least recently used entry is evicted first.
    pub fn set(&mut self, key: String, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        if key.len() > MAX_KEY_LENGTH {
            self.stats.record_rejection();
            return Err(CacheError::KeyTooLong(MAX_KEY_LENGTH));
        }
        if value.len() > MAX_VALUE_SIZE {
            self.stats.record_rejection();
            return Err(CacheError::ValueTooLarge(MAX_VALUE_SIZE));
        }

        let is_overwrite = self.entries.contains_key(&key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            // Prefer reclaiming expired entries over evicting live ones
            if self.cleanup_expired() == 0 {
                if let Some(evicted_key) = self.lru.evict_oldest() {
                    self.entries.remove(&evicted_key);
                    self.stats.record_eviction();
                }
            }
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));
        self.lru.touch(&key);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Returns the payload for `key` if present and not expired.
    ///
    /// Expired entries are removed on access and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_expired() {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
            self.stats.record_miss();
            return None;
        }

        let value = entry.value.clone();
        self.stats.record_hit();
        self.lru.touch(key);
        Some(value)
    }

    // == Clear ==
    /// Removes every entry unconditionally. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.stats.record_invalidation();
        self.stats.set_total_entries(0);
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
