//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set`, `PUT /mset` - Store one or several key-value pairs
//! - `GET /get/:key`, `POST /mget` - Retrieve one or several values
//! - `DELETE /del/:key`, `POST /del` - Delete one or several keys
//! - `GET /exists/:key`, `GET /count`, `DELETE /flush`
//! - `GET /ttl/:key`, `PUT /expire/:key` - Inspect or change expirations
//! - `GET /scan` - List keys matching a glob pattern
//! - `POST /save`, `POST /restore` - Snapshot persistence
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
