//! Cache Module
//!
//! Provides a bounded in-memory cache with FIFO/LRU eviction, lazy TTL
//! expiration and snapshot persistence.

mod entry;
mod policy;
mod snapshot;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use policy::EvictionPolicy;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Max size value that disables eviction
pub const NO_MAX_SIZE: usize = 0;

/// Max size of a store built without `with_max_size`
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Maximum allowed key length in bytes on the HTTP surface
pub const MAX_KEY_LENGTH: usize = 256;
