//! Cache Store Module
//!
//! Main cache engine: a hash index over an arena of entries, threaded into a
//! doubly-linked eviction list (head = most relevant, tail = next victim).

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::TimeDelta;
use parking_lot::RwLock;
use tracing::debug;

use crate::cache::entry::{current_timestamp_nanos, expiration_from_ttl};
use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats, EvictionPolicy, DEFAULT_MAX_SIZE, NO_MAX_SIZE};
use crate::error::{CacheError, Result};

// == Store Internals ==
/// Index, arena and list ends. Always mutated as one unit under the lock.
pub(super) struct Inner<V> {
    /// Key -> arena slot
    pub(super) index: HashMap<String, usize>,
    /// Arena of entries; `None` marks a free slot
    slots: Vec<Option<CacheEntry<V>>>,
    /// Free slots available for reuse
    free: Vec<usize>,
    /// Most relevant entry
    pub(super) head: Option<usize>,
    /// Least relevant entry, evicted first
    pub(super) tail: Option<usize>,
    /// Last relevant timestamp handed out
    last_stamp: i64,
}

impl<V> Inner<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            last_stamp: 0,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.index.len()
    }

    pub(super) fn node(&self, slot: usize) -> Option<&CacheEntry<V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut CacheEntry<V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn set_next(&mut self, slot: usize, next: Option<usize>) {
        if let Some(entry) = self.node_mut(slot) {
            entry.next = next;
        }
    }

    fn set_previous(&mut self, slot: usize, previous: Option<usize>) {
        if let Some(entry) = self.node_mut(slot) {
            entry.previous = previous;
        }
    }

    /// Slot of `key` if it is indexed and not expired at `now`.
    fn live_slot(&self, key: &str, now: i64) -> Option<usize> {
        self.index
            .get(key)
            .copied()
            .filter(|&slot| self.node(slot).is_some_and(|entry| !entry.is_expired(now)))
    }

    /// Returns a relevant timestamp strictly greater than every previous one.
    fn next_stamp(&mut self, now: i64) -> i64 {
        self.last_stamp = now.max(self.last_stamp.saturating_add(1));
        self.last_stamp
    }

    /// Stores an unlinked entry in a free slot and indexes it.
    fn alloc(&mut self, entry: CacheEntry<V>) -> usize {
        let key = entry.key.clone();
        let slot = match self.free.pop() {
            Some(slot) => {
                debug_assert!(self.slots[slot].is_none(), "free list holds an occupied slot");
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        slot
    }

    /// Attaches an unlinked entry in front of the current head.
    fn link_at_head(&mut self, slot: usize) {
        let old_head = self.head;
        let Some(entry) = self.node_mut(slot) else {
            return;
        };
        entry.previous = old_head;
        entry.next = None;
        match old_head {
            Some(head) => self.set_next(head, Some(slot)),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    /// Detaches an entry from the list, repairing its neighbours and the ends.
    fn unlink(&mut self, slot: usize) {
        let Some(entry) = self.node_mut(slot) else {
            return;
        };
        let (previous, next) = (entry.previous.take(), entry.next.take());
        match previous {
            Some(previous) => self.set_next(previous, next),
            None => self.tail = next,
        }
        match next {
            Some(next) => self.set_previous(next, previous),
            None => self.head = previous,
        }
    }

    fn move_to_head(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.link_at_head(slot);
    }

    /// Restamps an entry and makes it the head.
    fn promote(&mut self, slot: usize, now: i64) {
        let stamp = self.next_stamp(now);
        if let Some(entry) = self.node_mut(slot) {
            entry.relevant_timestamp = stamp;
            self.move_to_head(slot);
        }
    }

    /// Promotes `slot` only if `key` still maps to it. A slot observed under
    /// the shared lock may have been deleted, evicted or reused by the time
    /// the exclusive lock is taken.
    fn promote_if_indexed(&mut self, key: &str, slot: usize, now: i64) -> bool {
        if self.index.get(key) != Some(&slot) {
            return false;
        }
        self.promote(slot, now);
        true
    }

    /// Removes an entry from both the list and the index.
    fn remove_slot(&mut self, slot: usize) -> Option<CacheEntry<V>> {
        self.unlink(slot);
        let entry = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        self.index.remove(&entry.key);
        Some(entry)
    }

    /// Removes the tail entry. Returns false when the store is empty.
    pub(super) fn evict(&mut self) -> bool {
        let Some(tail) = self.tail else {
            return false;
        };
        match self.remove_slot(tail) {
            Some(evicted) => {
                debug!("Evicted key '{}'", evicted.key);
                true
            }
            None => false,
        }
    }

    pub(super) fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    /// Replaces the contents with `entries`, linking the oldest
    /// `relevant_timestamp` at the tail and the newest at the head.
    pub(super) fn rebuild(&mut self, mut entries: Vec<CacheEntry<V>>) {
        self.clear();
        entries.sort_by_key(|entry| entry.relevant_timestamp);
        for entry in entries {
            self.last_stamp = self.last_stamp.max(entry.relevant_timestamp);
            let slot = self.alloc(entry);
            self.link_at_head(slot);
        }
    }

    /// Iterates entries from head to tail.
    pub(super) fn iter(&self) -> ListIter<'_, V> {
        ListIter {
            inner: self,
            current: self.head,
            remaining: self.len(),
        }
    }
}

/// Walks the list from head to tail.
pub(super) struct ListIter<'a, V> {
    inner: &'a Inner<V>,
    current: Option<usize>,
    remaining: usize,
}

impl<'a, V> Iterator for ListIter<'a, V> {
    type Item = &'a CacheEntry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.inner.node(self.current?)?;
        self.current = entry.previous;
        self.remaining -= 1;
        Some(entry)
    }
}

// == Cache Store ==
/// Concurrency-safe cache with bounded size, FIFO/LRU eviction and lazy TTL
/// expiration.
///
/// Expired entries are never reaped in the background. They stay counted
/// until overwritten, deleted, evicted, cleared or dropped by a restore, but
/// every read treats them as absent.
pub struct CacheStore<V> {
    pub(super) inner: RwLock<Inner<V>>,
    pub(super) max_size: usize,
    eviction_policy: EvictionPolicy,
    pub(super) stats: StatsCounters,
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("max_size", &self.max_size)
            .field("eviction_policy", &self.eviction_policy)
            .field("count", &self.inner.read().len())
            .finish()
    }
}

impl<V: Clone> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty FIFO store bounded to `DEFAULT_MAX_SIZE` entries.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::new()),
            max_size: DEFAULT_MAX_SIZE,
            eviction_policy: EvictionPolicy::default(),
            stats: StatsCounters::default(),
        }
    }

    /// Sets the maximum number of entries. `NO_MAX_SIZE` (0) means unbounded.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the eviction policy.
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.eviction_policy
    }

    // == Set ==
    /// Creates or updates a key that never expires.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, None);
    }

    /// Creates or updates a key with an expiration. `None` never expires.
    ///
    /// Creating a key with a negative TTL is skipped, since the entry would
    /// be born expired. Updating an existing key always proceeds, whatever
    /// the TTL. Creates and updates both make the entry the head, and at most
    /// one entry is evicted per call.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Option<TimeDelta>) {
        let key = key.into();
        let now = current_timestamp_nanos();
        let expiration = expiration_from_ttl(now, ttl);
        let mut inner = self.inner.write();

        match inner.index.get(key.as_str()).copied() {
            Some(slot) => {
                if let Some(entry) = inner.node_mut(slot) {
                    entry.value = value;
                    entry.expiration = expiration;
                }
                inner.promote(slot, now);
            }
            None => {
                if ttl.is_some_and(|ttl| ttl < TimeDelta::zero()) {
                    debug!("Skipped creating '{}' with negative TTL", key);
                    return;
                }
                let stamp = inner.next_stamp(now);
                let slot = inner.alloc(CacheEntry::new(key, value, expiration, stamp));
                inner.link_at_head(slot);
            }
        }

        if self.max_size != NO_MAX_SIZE && inner.len() > self.max_size && inner.evict() {
            self.stats.record_evictions(1);
        }
    }

    // == Get ==
    /// Retrieves a value if the key exists and has not expired.
    ///
    /// Under `LeastRecentlyUsed` a hit that is not already the head is moved
    /// to the head in a second, exclusive critical section.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = current_timestamp_nanos();
        let inner = self.inner.read();
        let found = inner.live_slot(key, now).and_then(|slot| {
            inner
                .node(slot)
                .map(|entry| (slot, entry.value.clone(), inner.head == Some(slot)))
        });
        drop(inner);
        let Some((slot, value, is_head)) = found else {
            self.stats.record_miss();
            return None;
        };
        self.stats.record_hit();

        if self.eviction_policy.reorders_on_read() && !is_head {
            self.inner.write().promote_if_indexed(key, slot, now);
        }
        Some(value)
    }

    /// Looks up every key with `get`. Missing and expired keys map to `None`.
    pub fn get_all<S: AsRef<str>>(&self, keys: &[S]) -> HashMap<String, Option<V>> {
        keys.iter()
            .map(|key| (key.as_ref().to_string(), self.get(key.as_ref())))
            .collect()
    }

    // == Exists ==
    /// Whether the key is present and not expired. Never reorders.
    pub fn exists(&self, key: &str) -> bool {
        let now = current_timestamp_nanos();
        self.inner.read().live_slot(key, now).is_some()
    }

    // == Delete ==
    /// Removes a key, expired or not. Returns false if it was not indexed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write();
        let slot = inner.index.get(key).copied();
        slot.and_then(|slot| inner.remove_slot(slot)).is_some()
    }

    /// Removes every listed key. Returns how many were removed.
    pub fn delete_all<S: AsRef<str>>(&self, keys: &[S]) -> usize {
        let mut inner = self.inner.write();
        keys.iter()
            .filter_map(|key| {
                let slot = inner.index.get(key.as_ref()).copied()?;
                inner.remove_slot(slot)
            })
            .count()
    }

    // == Count ==
    /// Number of indexed entries, expired ones included.
    pub fn count(&self) -> usize {
        self.inner.read().len()
    }

    // == Clear ==
    /// Removes every entry. Size bound and policy are kept.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    // == Time To Live ==
    /// Returns the time left before the key expires.
    ///
    /// # Errors
    /// - `CacheError::NotFound` if the key is absent or already expired
    /// - `CacheError::NoExpiration` if the key never expires
    pub fn ttl(&self, key: &str) -> Result<Duration> {
        let now = current_timestamp_nanos();
        let inner = self.inner.read();
        let entry = inner
            .index
            .get(key)
            .and_then(|&slot| inner.node(slot))
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        match entry.expiration {
            None => Err(CacheError::NoExpiration(key.to_string())),
            Some(expiration) if expiration > now => {
                Ok(Duration::from_nanos(expiration.abs_diff(now)))
            }
            Some(_) => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Expire ==
    /// Rewrites the expiration of a live key. `None` clears the expiration and
    /// a zero TTL expires the key immediately.
    ///
    /// Returns false if the key is absent or already expired. This is not an
    /// access: the entry keeps its position even under `LeastRecentlyUsed`.
    pub fn expire(&self, key: &str, ttl: Option<TimeDelta>) -> bool {
        let now = current_timestamp_nanos();
        let mut inner = self.inner.write();
        let Some(slot) = inner.live_slot(key, now) else {
            return false;
        };
        match inner.node_mut(slot) {
            Some(entry) => {
                entry.expiration = expiration_from_ttl(now, ttl);
                true
            }
            None => false,
        }
    }

    // == Keys ==
    /// All indexed keys, expired ones included, from head to tail.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().iter().map(|entry| entry.key.clone()).collect()
    }

    /// Up to `limit` live keys matching a glob pattern, head first.
    ///
    /// Supports `*`, `?` and `[...]` character classes.
    ///
    /// # Errors
    /// - `CacheError::InvalidRequest` if the pattern does not compile
    pub fn scan(&self, pattern: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = glob::Pattern::new(pattern).map_err(|e| {
            CacheError::InvalidRequest(format!("Invalid scan pattern '{}': {}", pattern, e))
        })?;
        let now = current_timestamp_nanos();
        Ok(self
            .inner
            .read()
            .iter()
            .filter(|entry| !entry.is_expired(now) && pattern.matches(&entry.key))
            .take(limit)
            .map(|entry| entry.key.clone())
            .collect())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.count())
    }

    /// Panics unless the index and the list hold exactly the same entries,
    /// linked consistently in both directions, in strictly decreasing
    /// `relevant_timestamp` order from head to tail.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let inner = self.inner.read();
        let len = inner.len();
        assert_eq!(inner.head.is_none(), len == 0, "head must be None iff empty");
        assert_eq!(inner.tail.is_none(), len == 0, "tail must be None iff empty");
        if len == 1 {
            assert_eq!(inner.head, inner.tail);
        }

        let mut visited = std::collections::HashSet::new();
        let mut current = inner.head;
        let mut newer: Option<usize> = None;
        let mut last_stamp = i64::MAX;
        while let Some(slot) = current {
            assert!(visited.insert(slot), "cycle detected at slot {}", slot);
            assert!(visited.len() <= len, "list is longer than the index");
            let entry = inner.node(slot).expect("linked slot is occupied");
            assert_eq!(inner.index.get(&entry.key), Some(&slot), "unindexed list node");
            assert_eq!(entry.next, newer, "broken next link at '{}'", entry.key);
            assert!(entry.relevant_timestamp < last_stamp, "list out of timestamp order");
            last_stamp = entry.relevant_timestamp;
            newer = Some(slot);
            current = entry.previous;
        }
        assert_eq!(newer, inner.tail, "walk did not end at the tail");
        assert_eq!(visited.len(), len, "indexed entries missing from the list");
    }
}
