//! Cache Entry Module
//!
//! Defines a cached response payload together with its expiry metadata.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A serialized response payload and the time it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The serialized payload
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry that lives for `ttl`.
    pub fn new(value: String, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is valid only while `now - created_at < ttl`, so it counts as
    /// expired from the exact millisecond its TTL has elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        let now = current_timestamp_ms();
        Duration::from_millis(self.expires_at.saturating_sub(now))
    }

    /// Age of the entry.
    pub fn age(&self) -> Duration {
        Duration::from_millis(current_timestamp_ms().saturating_sub(self.created_at))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("{\"products\":[]}".to_string(), Duration::from_secs(60));

        assert_eq!(entry.value, "{\"products\":[]}");
        assert_eq!(entry.expires_at - entry.created_at, 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("payload".to_string(), Duration::from_millis(50));

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("payload".to_string(), Duration::from_secs(10));

        let remaining = entry.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let entry = CacheEntry::new("payload".to_string(), Duration::from_millis(10));

        sleep(Duration::from_millis(30));

        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
        assert!(entry.age() >= Duration::from_millis(30));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry {
            value: "payload".to_string(),
            created_at: 1_000,
            expires_at: 1_500,
        };

        assert!(!entry.is_expired_at(1_499));
        assert!(entry.is_expired_at(1_500), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(2_000));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let entry = CacheEntry::new("payload".to_string(), Duration::ZERO);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new("payload".to_string(), Duration::MAX);
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired());
    }
}
