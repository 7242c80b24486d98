//! Cache Entry Module
//!
//! Defines the unit of storage: a key, an opaque value, expiration metadata
//! and the two ordering links that place the entry in the eviction list.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::TimeDelta;

// == Cache Entry ==
/// A single cached item.
///
/// `previous` points one step toward the tail (older entries) and `next` one
/// step toward the head (newer entries). Both are arena slots owned by the
/// store; they only encode position.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The key this entry is indexed under
    pub key: String,
    /// The stored value, never inspected by the cache
    pub value: V,
    /// Expiration instant (Unix nanoseconds), None = never expires
    pub expiration: Option<i64>,
    /// Instant the entry was last moved to the head (Unix nanoseconds)
    pub relevant_timestamp: i64,
    pub(crate) previous: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an unlinked entry.
    pub fn new(key: String, value: V, expiration: Option<i64>, relevant_timestamp: i64) -> Self {
        Self {
            key,
            value,
            expiration,
            relevant_timestamp,
            previous: None,
            next: None,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now` (Unix nanoseconds).
    ///
    /// An entry is expired once `now` reaches its expiration instant, so an
    /// entry given a zero TTL is expired from the moment it is written.
    pub fn is_expired(&self, now: i64) -> bool {
        match self.expiration {
            Some(expiration) => now >= expiration,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in nanoseconds.
///
/// Clamps to zero if the system clock is set before the epoch.
pub fn current_timestamp_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Resolves a TTL relative to `now` into an absolute expiration.
///
/// `None` means the entry never expires. Saturates instead of overflowing
/// for durations beyond the representable range.
pub fn expiration_from_ttl(now: i64, ttl: Option<TimeDelta>) -> Option<i64> {
    ttl.map(|ttl| {
        let nanos = ttl.num_nanoseconds().unwrap_or(if ttl < TimeDelta::zero() {
            i64::MIN
        } else {
            i64::MAX
        });
        now.saturating_add(nanos)
    })
}
