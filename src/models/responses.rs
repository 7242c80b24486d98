//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;

use serde::Serialize;

/// TTL reported for a key that never expires
pub const TTL_NO_EXPIRATION: i64 = -1;

/// TTL reported for a key that is absent or already expired
pub const TTL_NO_SUCH_KEY: i64 = -2;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the MGET operation (POST /mget)
///
/// Every requested key is present; absent or expired keys map to `null`.
#[derive(Debug, Clone, Serialize)]
pub struct MultiGetResponse {
    pub values: HashMap<String, Option<String>>,
}

/// Response body for the SET and MSET operations
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// Number of keys written
    pub count: usize,
}

impl SetResponse {
    /// Creates a new SetResponse for a single key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            message: format!("Key '{}' set successfully", key.into()),
            count: 1,
        }
    }

    /// Creates a new SetResponse for several keys
    pub fn many(count: usize) -> Self {
        Self {
            message: format!("{} keys set successfully", count),
            count,
        }
    }
}

/// Response body for the DELETE operations (DELETE /del/:key, POST /del)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Number of keys removed
    pub deleted: usize,
}

/// Response body for the EXISTS operation (GET /exists/:key)
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub exists: bool,
}

/// Response body for the COUNT operation (GET /count)
#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    /// Entries in the cache, including expired ones not yet removed
    pub count: usize,
}

/// Response body for the TTL operation (GET /ttl/:key)
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub key: String,
    /// Milliseconds left, or `TTL_NO_EXPIRATION` / `TTL_NO_SUCH_KEY`
    pub ttl_ms: i64,
}

/// Response body for the EXPIRE operation (PUT /expire/:key)
#[derive(Debug, Clone, Serialize)]
pub struct ExpireResponse {
    pub key: String,
    /// False when the key is absent or already expired
    pub updated: bool,
}

/// Response body for the SCAN operation (GET /scan)
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    /// Always 0: a scan returns everything in one pass
    pub cursor: u64,
    pub keys: Vec<String>,
}

/// Response body for the snapshot operations (POST /save, POST /restore)
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub message: String,
    /// Entries in the cache after the operation
    pub count: usize,
    /// Entries evicted by the restore to respect the maximum size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evicted: Option<usize>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Configured maximum size, 0 = unbounded
    pub max_size: usize,
    /// Configured eviction policy
    pub eviction_policy: String,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
