//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    count_handler, delete_handler, exists_handler, expire_handler, flush_handler, get_handler,
    health_handler, multi_delete_handler, multi_get_handler, multi_set_handler, restore_handler,
    save_handler, scan_handler, set_handler, stats_handler, ttl_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/mset", put(multi_set_handler))
        .route("/get/:key", get(get_handler))
        .route("/mget", post(multi_get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/del", post(multi_delete_handler))
        .route("/exists/:key", get(exists_handler))
        .route("/count", get(count_handler))
        .route("/flush", delete(flush_handler))
        .route("/ttl/:key", get(ttl_handler))
        .route("/expire/:key", put(expire_handler))
        .route("/scan", get(scan_handler))
        .route("/save", post(save_handler))
        .route("/restore", post(restore_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
