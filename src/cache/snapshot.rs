//! Snapshot Module
//!
//! Saves the full entry set to a file and restores it, rebuilding the
//! eviction list from each entry's relevant timestamp.
//!
//! The file is a single JSON object mapping every key to
//! `{key, value, expiration, relevant_timestamp}`, with `expiration` set to
//! `null` for keys that never expire. List links are not persisted.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{CacheEntry, CacheStore, NO_MAX_SIZE};
use crate::error::{CacheError, Result};

// == Snapshot Records ==
#[derive(Serialize)]
struct EntryRecordRef<'a, V> {
    key: &'a str,
    value: &'a V,
    expiration: Option<i64>,
    relevant_timestamp: i64,
}

#[derive(Deserialize)]
struct EntryRecord<V> {
    key: String,
    value: V,
    expiration: Option<i64>,
    relevant_timestamp: i64,
}

/// Encodes entries into the snapshot format.
fn encode<'a, V, I>(entries: I) -> Result<Vec<u8>>
where
    V: Serialize + 'a,
    I: Iterator<Item = &'a CacheEntry<V>>,
{
    let records: HashMap<&str, EntryRecordRef<'_, V>> = entries
        .map(|entry| {
            let record = EntryRecordRef {
                key: &entry.key,
                value: &entry.value,
                expiration: entry.expiration,
                relevant_timestamp: entry.relevant_timestamp,
            };
            (entry.key.as_str(), record)
        })
        .collect();
    serde_json::to_vec(&records).map_err(CacheError::Encode)
}

/// Decodes the snapshot format into unlinked entries.
fn decode<V: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<CacheEntry<V>>> {
    let records: HashMap<String, EntryRecord<V>> =
        serde_json::from_slice(bytes).map_err(CacheError::Decode)?;

    records
        .into_iter()
        .map(|(key, record)| {
            if key != record.key {
                return Err(CacheError::Decode(serde_json::Error::custom(format!(
                    "entry indexed as '{}' is keyed '{}'",
                    key, record.key
                ))));
            }
            Ok(CacheEntry::new(
                record.key,
                record.value,
                record.expiration,
                record.relevant_timestamp,
            ))
        })
        .collect()
}

impl<V> CacheStore<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    // == Save ==
    /// Writes every entry, expired ones included, to `path`, replacing any
    /// existing content.
    ///
    /// Encoding runs under the shared lock so the snapshot is consistent with
    /// concurrent readers and writers. Concurrent saves to the same path must
    /// be serialized by the caller.
    ///
    /// # Errors
    /// - `CacheError::Io` if the file cannot be created or written
    /// - `CacheError::Encode` if a value cannot be serialized
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (bytes, count) = {
            let inner = self.inner.read();
            (encode(inner.iter())?, inner.len())
        };

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&bytes)?;
        writer.flush()?;

        info!("Saved {} entries to {}", count, path.display());
        Ok(())
    }

    // == Restore ==
    /// Replaces the store's contents with the snapshot at `path`.
    ///
    /// Entries are relinked oldest-to-newest by relevant timestamp, then
    /// evicted from the tail until the configured maximum size is respected.
    /// The file is only read, so a restore can be retried after changing the
    /// maximum size.
    ///
    /// Returns the number of entries evicted.
    ///
    /// # Errors
    /// - `CacheError::Io` if the file cannot be read
    /// - `CacheError::Decode` if its content is not a valid snapshot
    ///
    /// On error the store is left untouched.
    pub fn read_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let entries = decode::<V>(&bytes)?;
        let restored = entries.len();

        let mut inner = self.inner.write();
        inner.rebuild(entries);

        let mut evictions = 0;
        if self.max_size != NO_MAX_SIZE {
            while inner.len() > self.max_size && inner.evict() {
                evictions += 1;
            }
        }
        drop(inner);

        self.stats.record_evictions(evictions as u64);
        info!(
            "Restored {} entries from {} ({} evicted)",
            restored,
            path.display(),
            evictions
        );
        Ok(evictions)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvictionPolicy;
    use chrono::TimeDelta;
    use tempfile::TempDir;

    fn snapshot_path(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join("cache.snapshot")
    }

    #[test]
    fn test_round_trip_preserves_values_and_count() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);

        let store: CacheStore<String> = CacheStore::new().with_max_size(10);
        store.set("a", "1".to_string());
        store.set("b", "2".to_string());
        store.set_with_ttl("c", "3".to_string(), Some(TimeDelta::seconds(60)));
        store.save_to_file(&path).unwrap();

        let restored: CacheStore<String> = CacheStore::new().with_max_size(10);
        assert_eq!(restored.read_from_file(&path).unwrap(), 0);

        assert_eq!(restored.count(), 3);
        assert_eq!(restored.get("a"), Some("1".to_string()));
        assert_eq!(restored.get("b"), Some("2".to_string()));
        assert_eq!(restored.get("c"), Some("3".to_string()));
        assert!(matches!(restored.ttl("a"), Err(CacheError::NoExpiration(_))));
        assert!(restored.ttl("c").unwrap().as_secs() >= 58);
        restored.assert_consistent();
    }

    #[test]
    fn test_restore_rebuilds_order_from_timestamps() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);

        let store: CacheStore<u32> = CacheStore::new()
            .with_max_size(3)
            .with_eviction_policy(EvictionPolicy::LeastRecentlyUsed);
        store.set("a", 1);
        store.set("b", 2);
        store.set("c", 3);
        // Reading a makes it the newest
        store.get("a");
        store.save_to_file(&path).unwrap();

        let restored: CacheStore<u32> = CacheStore::new().with_max_size(3);
        restored.read_from_file(&path).unwrap();
        assert_eq!(restored.keys(), store.keys());
        restored.assert_consistent();

        restored.set("d", 4);
        assert!(!restored.exists("b"), "b is the oldest and evicted first");
        assert!(restored.exists("a"));
    }

    #[test]
    fn test_restore_with_smaller_max_size_evicts_oldest() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);

        let store: CacheStore<String> = CacheStore::new().with_max_size(0);
        for key in ["k1", "k2", "k3", "k4", "k5"] {
            store.set(key, key.to_string());
        }
        store.save_to_file(&path).unwrap();

        let small: CacheStore<String> = CacheStore::new().with_max_size(2);
        assert_eq!(small.read_from_file(&path).unwrap(), 3);
        assert_eq!(small.keys(), vec!["k5", "k4"]);
        assert_eq!(small.stats().evictions, 3);
        small.assert_consistent();

        // The file is untouched, so a larger store can retry
        let large: CacheStore<String> = CacheStore::new().with_max_size(10);
        assert_eq!(large.read_from_file(&path).unwrap(), 0);
        assert_eq!(large.count(), 5);
    }

    #[test]
    fn test_restore_replaces_existing_entries() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);

        let store: CacheStore<String> = CacheStore::new();
        store.set("saved", "v".to_string());
        store.save_to_file(&path).unwrap();

        let target: CacheStore<String> = CacheStore::new();
        target.set("stale", "v".to_string());
        target.read_from_file(&path).unwrap();

        assert_eq!(target.keys(), vec!["saved"]);
        target.assert_consistent();
    }

    #[test]
    fn test_expired_entries_survive_round_trip_as_expired() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);

        let store: CacheStore<String> = CacheStore::new();
        store.set_with_ttl("gone", "v".to_string(), Some(TimeDelta::zero()));
        store.save_to_file(&path).unwrap();

        let restored: CacheStore<String> = CacheStore::new();
        restored.read_from_file(&path).unwrap();
        assert_eq!(restored.count(), 1);
        assert_eq!(restored.get("gone"), None);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);
        fs::write(&path, "x".repeat(4096)).unwrap();

        let store: CacheStore<String> = CacheStore::new();
        store.set("a", "1".to_string());
        store.save_to_file(&path).unwrap();

        let restored: CacheStore<String> = CacheStore::new();
        restored.read_from_file(&path).unwrap();
        assert_eq!(restored.count(), 1);
    }

    #[test]
    fn test_restore_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store: CacheStore<String> = CacheStore::new();
        store.set("kept", "v".to_string());

        let result = store.read_from_file(dir.path().join("missing.snapshot"));

        assert!(matches!(result, Err(CacheError::Io(_))));
        assert_eq!(store.keys(), vec!["kept"]);
    }

    #[test]
    fn test_restore_corrupt_file_is_decode_error_and_keeps_state() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);
        fs::write(&path, b"\x00\x01not json").unwrap();

        let store: CacheStore<String> = CacheStore::new();
        store.set("kept", "v".to_string());

        assert!(matches!(store.read_from_file(&path), Err(CacheError::Decode(_))));
        assert_eq!(store.keys(), vec!["kept"]);
        store.assert_consistent();
    }

    #[test]
    fn test_restore_incompatible_value_type_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);

        let store: CacheStore<String> = CacheStore::new();
        store.set("a", "not a number".to_string());
        store.save_to_file(&path).unwrap();

        let numbers: CacheStore<u64> = CacheStore::new();
        assert!(matches!(numbers.read_from_file(&path), Err(CacheError::Decode(_))));
        assert_eq!(numbers.count(), 0);
    }

    #[test]
    fn test_never_expiring_entries_encode_as_null() {
        let entry = CacheEntry::new("forever".to_string(), 1u32, None, 1);

        let bytes = encode(std::iter::once(&entry)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["forever"]["expiration"].is_null());
    }

    #[test]
    fn test_expiration_at_minus_one_is_not_never() {
        // An update with a -1ns TTL while the clock reads 0 lands here
        let entry = CacheEntry::new("key".to_string(), 1u32, Some(-1), 1);

        let decoded = decode::<u32>(&encode(std::iter::once(&entry)).unwrap()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].expiration, Some(-1));
        assert!(decoded[0].is_expired(0));
    }

    #[test]
    fn test_restore_rejects_mismatched_keys() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);
        fs::write(
            &path,
            r#"{"a":{"key":"b","value":"v","expiration":null,"relevant_timestamp":1}}"#,
        )
        .unwrap();

        let store: CacheStore<String> = CacheStore::new();
        assert!(matches!(store.read_from_file(&path), Err(CacheError::Decode(_))));
    }

    #[test]
    fn test_heterogeneous_values_with_json_value() {
        let dir = TempDir::new().unwrap();
        let path = snapshot_path(&dir);

        let store: CacheStore<serde_json::Value> = CacheStore::new();
        store.set("number", serde_json::json!(42));
        store.set("list", serde_json::json!(["a", "b"]));
        store.save_to_file(&path).unwrap();

        let restored: CacheStore<serde_json::Value> = CacheStore::new();
        restored.read_from_file(&path).unwrap();
        assert_eq!(restored.get("number"), Some(serde_json::json!(42)));
        assert_eq!(restored.get("list"), Some(serde_json::json!(["a", "b"])));
    }
}
