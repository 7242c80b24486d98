//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::{EvictionPolicy, DEFAULT_MAX_SIZE};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold, 0 = unbounded
    pub max_size: usize,
    /// Eviction policy of the cache
    pub eviction_policy: EvictionPolicy,
    /// HTTP server port
    pub server_port: u16,
    /// Snapshot file restored on start and saved periodically and on shutdown
    pub autosave_file: Option<PathBuf>,
    /// Interval in seconds between autosaves
    pub autosave_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_SIZE` - Maximum cache entries, 0 = unbounded (default: 1000)
    /// - `EVICTION_POLICY` - `fifo` or `lru` (default: fifo)
    /// - `SERVER_PORT` - HTTP server port (default: 6380)
    /// - `AUTOSAVE_FILE` - Snapshot path (default: unset, no persistence)
    /// - `AUTOSAVE_INTERVAL` - Autosave frequency in seconds (default: 600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: parse_var("MAX_SIZE").unwrap_or(defaults.max_size),
            eviction_policy: parse_var("EVICTION_POLICY").unwrap_or(defaults.eviction_policy),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            autosave_file: env::var("AUTOSAVE_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            autosave_interval: parse_var("AUTOSAVE_INTERVAL")
                .filter(|&secs| secs > 0)
                .unwrap_or(defaults.autosave_interval),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            eviction_policy: EvictionPolicy::FirstInFirstOut,
            server_port: 6380,
            autosave_file: None,
            autosave_interval: 600,
        }
    }
}
