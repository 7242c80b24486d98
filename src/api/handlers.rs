//! API Handlers
//!
//! HTTP request handlers mapping each endpoint onto one cache operation.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, CountResponse, DeleteResponse, ExistsResponse, ExpireRequest, ExpireResponse,
    GetResponse, HealthResponse, KeysRequest, MultiGetResponse, MultiSetRequest, ScanQuery,
    ScanResponse, SetRequest, SetResponse, SnapshotResponse, StatsResponse, TtlResponse,
    TTL_NO_EXPIRATION, TTL_NO_SUCH_KEY,
};

/// Application state shared across all handlers.
///
/// The store synchronizes itself, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<CacheStore<String>>,
    /// Snapshot file used by the save and restore endpoints
    pub snapshot_path: Option<PathBuf>,
}

impl AppState {
    /// Creates a new AppState with the given cache store and no snapshot file.
    pub fn new(cache: CacheStore<String>) -> Self {
        Self {
            cache: Arc::new(cache),
            snapshot_path: None,
        }
    }

    /// Sets the snapshot file used by the save and restore endpoints.
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Initializes the cache store with parameters from the Config.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheStore::new()
            .with_max_size(config.max_size)
            .with_eviction_policy(config.eviction_policy);
        Self {
            cache: Arc::new(cache),
            snapshot_path: config.autosave_file.clone(),
        }
    }

    fn require_snapshot_path(&self) -> Result<PathBuf> {
        self.snapshot_path
            .clone()
            .ok_or_else(|| CacheError::InvalidRequest("No snapshot file configured".to_string()))
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl();
    state.cache.set_with_ttl(req.key.clone(), req.value, ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for PUT /mset
pub async fn multi_set_handler(
    State(state): State<AppState>,
    Json(req): Json<MultiSetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let count = req.entries.len();
    for entry in req.entries {
        let ttl = entry.ttl();
        state.cache.set_with_ttl(entry.key, entry.value, ttl);
    }

    Ok(Json(SetResponse::many(count)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for POST /mget
pub async fn multi_get_handler(
    State(state): State<AppState>,
    Json(req): Json<KeysRequest>,
) -> Result<Json<MultiGetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    Ok(Json(MultiGetResponse {
        values: state.cache.get_all(&req.keys),
    }))
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache, expired or not.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.delete(&key) {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse { deleted: 1 }))
}

/// Handler for POST /del
pub async fn multi_delete_handler(
    State(state): State<AppState>,
    Json(req): Json<KeysRequest>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    Ok(Json(DeleteResponse {
        deleted: state.cache.delete_all(&req.keys),
    }))
}

/// Handler for GET /exists/:key
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<ExistsResponse> {
    let exists = state.cache.exists(&key);
    Json(ExistsResponse { key, exists })
}

/// Handler for GET /count
pub async fn count_handler(State(state): State<AppState>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.cache.count(),
    })
}

/// Handler for DELETE /flush
pub async fn flush_handler(State(state): State<AppState>) -> Json<CountResponse> {
    state.cache.clear();
    Json(CountResponse { count: 0 })
}

/// Handler for GET /ttl/:key
///
/// Reports absent and never-expiring keys with the Redis sentinels instead
/// of an error status.
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    let ttl_ms = match state.cache.ttl(&key) {
        Ok(remaining) => i64::try_from(remaining.as_millis()).unwrap_or(i64::MAX),
        Err(CacheError::NotFound(_)) => TTL_NO_SUCH_KEY,
        Err(CacheError::NoExpiration(_)) => TTL_NO_EXPIRATION,
        Err(other) => return Err(other),
    };

    Ok(Json(TtlResponse { key, ttl_ms }))
}

/// Handler for PUT /expire/:key
pub async fn expire_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ExpireRequest>,
) -> Result<Json<ExpireResponse>> {
    check_key(&key)?;
    let updated = state.cache.expire(&key, req.ttl());

    Ok(Json(ExpireResponse { key, updated }))
}

/// Handler for GET /scan
pub async fn scan_handler(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanResponse>> {
    let keys = state.cache.scan(&query.pattern, query.count)?;

    Ok(Json(ScanResponse { cursor: 0, keys }))
}

/// Handler for POST /save
///
/// Writes the snapshot on a blocking thread.
pub async fn save_handler(State(state): State<AppState>) -> Result<Json<SnapshotResponse>> {
    let path = state.require_snapshot_path()?;
    let cache = Arc::clone(&state.cache);

    tokio::task::spawn_blocking(move || cache.save_to_file(&path))
        .await
        .map_err(|e| CacheError::Internal(format!("Save task failed: {}", e)))??;

    Ok(Json(SnapshotResponse {
        message: "Snapshot saved".to_string(),
        count: state.cache.count(),
        evicted: None,
    }))
}

/// Handler for POST /restore
///
/// Replaces the cache contents with the snapshot file.
pub async fn restore_handler(State(state): State<AppState>) -> Result<Json<SnapshotResponse>> {
    let path = state.require_snapshot_path()?;
    let cache = Arc::clone(&state.cache);

    let evicted = tokio::task::spawn_blocking(move || cache.read_from_file(&path))
        .await
        .map_err(|e| CacheError::Internal(format!("Restore task failed: {}", e)))??;

    Ok(Json(SnapshotResponse {
        message: "Snapshot restored".to_string(),
        count: state.cache.count(),
        evicted: Some(evicted),
    }))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();

    Json(StatsResponse {
        hits: stats.hits,
        misses: stats.misses,
        evictions: stats.evictions,
        total_entries: stats.total_entries,
        hit_rate: stats.hit_rate(),
        max_size: state.cache.max_size(),
        eviction_policy: state.cache.eviction_policy().to_string(),
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
