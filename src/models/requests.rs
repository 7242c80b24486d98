//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::TimeDelta;
use serde::Deserialize;

use crate::cache::MAX_KEY_LENGTH;

/// Checks a key before it reaches the store.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Converts an optional millisecond TTL into the store's TTL argument.
fn ttl_from_millis(ttl_ms: Option<i64>) -> Option<TimeDelta> {
    ttl_ms.map(|ms| TimeDelta::try_milliseconds(ms).unwrap_or(TimeDelta::MIN))
}

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl_ms`: Optional TTL in milliseconds (never expires if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<i64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }

    /// TTL to hand to the store, `None` = never expires
    pub fn ttl(&self) -> Option<TimeDelta> {
        ttl_from_millis(self.ttl_ms)
    }
}

/// Request body for the MSET operation (PUT /mset)
#[derive(Debug, Clone, Deserialize)]
pub struct MultiSetRequest {
    pub entries: Vec<SetRequest>,
}

impl MultiSetRequest {
    /// Validates every entry, reporting the first failure.
    pub fn validate(&self) -> Option<String> {
        if self.entries.is_empty() {
            return Some("At least one entry is required".to_string());
        }
        self.entries.iter().find_map(SetRequest::validate)
    }
}

/// Request body for operations over several keys (POST /mget, POST /del)
#[derive(Debug, Clone, Deserialize)]
pub struct KeysRequest {
    pub keys: Vec<String>,
}

impl KeysRequest {
    pub fn validate(&self) -> Option<String> {
        if self.keys.is_empty() {
            return Some("At least one key is required".to_string());
        }
        self.keys.iter().find_map(|key| validate_key(key))
    }
}

/// Request body for the EXPIRE operation (PUT /expire/:key)
///
/// A missing `ttl_ms` removes the expiration; `0` expires the key at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpireRequest {
    #[serde(default)]
    pub ttl_ms: Option<i64>,
}

impl ExpireRequest {
    pub fn ttl(&self) -> Option<TimeDelta> {
        ttl_from_millis(self.ttl_ms)
    }
}

/// Query string of the SCAN operation (GET /scan)
#[derive(Debug, Clone, Deserialize)]
pub struct ScanQuery {
    #[serde(default = "default_scan_pattern")]
    pub pattern: String,
    #[serde(default = "default_scan_count")]
    pub count: usize,
}

fn default_scan_pattern() -> String {
    "*".to_string()
}

fn default_scan_count() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert!(req.ttl_ms.is_none());
        assert!(req.ttl().is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl_ms": 60000}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl_ms, Some(60_000));
        assert_eq!(req.ttl(), Some(TimeDelta::seconds(60)));
    }

    #[test]
    fn test_set_request_with_negative_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl_ms": -5}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl(), Some(TimeDelta::milliseconds(-5)));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: "test".to_string(),
            ttl_ms: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_key_too_long() {
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH)).is_none());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetRequest {
            key: "valid_key".to_string(),
            value: "test".to_string(),
            ttl_ms: Some(60),
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_multi_set_reports_first_invalid_entry() {
        let json = r#"{"entries": [{"key": "ok", "value": "v"}, {"key": "", "value": "v"}]}"#;
        let req: MultiSetRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_some());

        let empty = MultiSetRequest { entries: vec![] };
        assert!(empty.validate().is_some());
    }

    #[test]
    fn test_keys_request_validation() {
        let req: KeysRequest = serde_json::from_str(r#"{"keys": ["k1", "k2"]}"#).unwrap();
        assert!(req.validate().is_none());

        let empty = KeysRequest { keys: vec![] };
        assert!(empty.validate().is_some());
    }

    #[test]
    fn test_expire_request_defaults_to_no_expiration() {
        let req: ExpireRequest = serde_json::from_str("{}").unwrap();
        assert!(req.ttl().is_none());
    }

    #[test]
    fn test_scan_query_defaults() {
        let query: ScanQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.pattern, "*");
        assert_eq!(query.count, 10);
    }
}
