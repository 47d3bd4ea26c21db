//! Cache Module
//!
//! In-process response cache with TTL expiration and LRU eviction, exposed to
//! the request handlers through the [`ResponseCache`] trait.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use shared::{LocalCache, ResponseCache};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 512;

/// Maximum allowed payload size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
