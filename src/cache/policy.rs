//! Eviction Policy Module
//!
//! Selects how the eviction list reacts to reads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// == Eviction Policy ==
/// Decides which entry is evicted when the store grows past its maximum size.
///
/// Both policies evict from the tail and relink inserts and updates at the
/// head; they differ only in whether a successful `get` relinks the entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Reads never reorder
    #[default]
    FirstInFirstOut,
    /// A successful read moves the entry to the head
    LeastRecentlyUsed,
}

impl EvictionPolicy {
    /// Whether a successful read moves the entry to the head.
    pub fn reorders_on_read(self) -> bool {
        matches!(self, EvictionPolicy::LeastRecentlyUsed)
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::FirstInFirstOut => write!(f, "fifo"),
            EvictionPolicy::LeastRecentlyUsed => write!(f, "lru"),
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" | "first_in_first_out" => Ok(EvictionPolicy::FirstInFirstOut),
            "lru" | "least_recently_used" => Ok(EvictionPolicy::LeastRecentlyUsed),
            other => Err(format!("unknown eviction policy '{}'", other)),
        }
    }
}
