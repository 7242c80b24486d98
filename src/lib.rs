//! Snapcache - An in-memory key-value cache
//!
//! Bounded store with FIFO or LRU eviction, lazy TTL expiration and
//! snapshot persistence, served over a small HTTP/JSON API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, EvictionPolicy};
pub use config::Config;
pub use error::CacheError;
pub use tasks::spawn_autosave_task;
