//! Shared Response Cache
//!
//! The cache abstraction handlers depend on, and its in-process implementation.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheStats, CacheStore};
use crate::error::CacheError;

/// Response cache used by the request handlers.
///
/// All methods take `&self`; implementations use interior mutability so one
/// instance can be shared across concurrent requests. A distributed cache can
/// be substituted without touching the handlers.
///
/// Invalidation is whole-cache only: every product write calls [`clear`],
/// which also drops cached pages the write did not affect. A `clear` racing
/// with an in-flight `set` may leave that one entry behind.
///
/// [`clear`]: ResponseCache::clear
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Returns the payload for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    async fn set(&self, key: String, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Drops every entry.
    async fn clear(&self);

    /// Drops expired entries, returning how many were removed.
    async fn purge_expired(&self) -> usize;

    async fn stats(&self) -> CacheStats;
}

/// [`CacheStore`] behind a tokio `RwLock`.
#[derive(Debug)]
pub struct LocalCache {
    store: RwLock<CacheStore>,
}

impl LocalCache {
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self::from_store(CacheStore::new(max_entries, default_ttl))
    }

    pub fn from_store(store: CacheStore) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }
}

#[async_trait]
impl ResponseCache for LocalCache {
    async fn get(&self, key: &str) -> Option<String> {
        // Write lock: a read also updates LRU order and stats
        self.store.write().await.get(key)
    }

    async fn set(&self, key: String, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.store.write().await.set(key, value, Some(ttl))
    }

    async fn clear(&self) {
        let removed = self.store.write().await.clear();
        tracing::debug!(removed, "Response cache cleared");
    }

    async fn purge_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}
