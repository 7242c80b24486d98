//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    validate_key, ExpireRequest, KeysRequest, MultiSetRequest, ScanQuery, SetRequest,
};
pub use responses::{
    CountResponse, DeleteResponse, ExistsResponse, ExpireResponse, GetResponse, HealthResponse,
    MultiGetResponse, ScanResponse, SetResponse, SnapshotResponse, StatsResponse, TtlResponse,
    TTL_NO_EXPIRATION, TTL_NO_SUCH_KEY,
};
