//! Cache Store Module
//!
//! Single-shard cache engine combining HashMap storage with LRU tracking and
//! TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, LruTracker, MAX_ARTIFACT_SIZE, MAX_KEY_LENGTH};
use crate::error::CacheError;
use crate::imaging::Artifact;

type Result<T> = std::result::Result<T, CacheError>;

// == Cache Store ==
/// Artifact storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `max_entries` artifacts.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
        }
    }

    // == Put ==
    /// Stores an artifact under `key` for `ttl`.
    ///
    /// An existing entry for the key is replaced wholesale. At capacity, the
    /// least recently used entry is evicted first.
    pub fn put(&mut self, key: String, value: Artifact, ttl: Duration) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if value.len() > MAX_ARTIFACT_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Artifact exceeds maximum size of {} bytes",
                MAX_ARTIFACT_SIZE
            )));
        }

        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            // Reclaim expired entries before dropping live ones
            if self.purge_expired() == 0 {
                match self.lru.evict_oldest() {
                    Some(evicted_key) => {
                        self.entries.remove(&evicted_key);
                        self.stats.record_eviction();
                    }
                    None => {
                        return Err(CacheError::CacheFull(
                            "Cache is full and eviction failed".to_string(),
                        ));
                    }
                }
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, Some(ttl)));
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Retrieves the artifact stored under `key`.
    ///
    /// Expired entries are removed on sight and reported as `Expired`.
    pub fn get(&mut self, key: &str) -> Result<Artifact> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return Err(CacheError::NotFound(key.to_string()));
            }
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
            self.stats.record_miss();
            return Err(CacheError::Expired(key.to_string()));
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Purge Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        self.stats.set_total_entries(self.entries.len());
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ArtifactFormat;
    use std::thread::sleep;

    const LONG: Duration = Duration::from_secs(300);

    fn artifact(tag: u8) -> Artifact {
        Artifact::new(vec![tag; 8], ArtifactFormat::Png, 2, 2)
    }

    fn put(store: &mut CacheStore, key: &str, tag: u8) {
        store.put(key.to_string(), artifact(tag), LONG).unwrap();
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(100);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_put_and_get() {
        let mut store = CacheStore::new(100);

        put(&mut store, "key1", 7);
        let value = store.get("key1").unwrap();

        assert_eq!(value.bytes(), &[7u8; 8]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new(100);
        assert!(matches!(store.get("nonexistent"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new(100);

        put(&mut store, "key1", 1);
        put(&mut store, "key1", 2);

        let value = store.get("key1").unwrap();
        assert_eq!(value.bytes(), &[2u8; 8]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(100);

        store
            .put("key1".to_string(), artifact(1), Duration::from_millis(100))
            .unwrap();
        assert!(store.get("key1").is_ok());

        sleep(Duration::from_millis(150));

        assert!(matches!(store.get("key1"), Err(CacheError::Expired(_))));
        assert!(store.is_empty());
        assert!(matches!(store.get("key1"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = CacheStore::new(3);

        put(&mut store, "key1", 1);
        put(&mut store, "key2", 2);
        put(&mut store, "key3", 3);
        put(&mut store, "key4", 4);

        assert_eq!(store.len(), 3);
        assert!(matches!(store.get("key1"), Err(CacheError::NotFound(_))));
        assert!(store.get("key2").is_ok());
        assert!(store.get("key4").is_ok());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = CacheStore::new(3);

        put(&mut store, "key1", 1);
        put(&mut store, "key2", 2);
        put(&mut store, "key3", 3);
        store.get("key1").unwrap();
        put(&mut store, "key4", 4);

        assert!(store.get("key1").is_ok());
        assert!(matches!(store.get("key2"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_full_store_reclaims_expired_before_evicting() {
        let mut store = CacheStore::new(2);

        store
            .put("short".to_string(), artifact(1), Duration::from_millis(50))
            .unwrap();
        put(&mut store, "long", 2);
        sleep(Duration::from_millis(100));
        put(&mut store, "new", 3);

        assert!(store.get("long").is_ok());
        assert!(store.get("new").is_ok());
        let stats = store.stats();
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(100);

        put(&mut store, "key1", 1);
        store.get("key1").unwrap();
        let _ = store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_purge_expired() {
        let mut store = CacheStore::new(100);

        store
            .put("key1".to_string(), artifact(1), Duration::from_millis(50))
            .unwrap();
        put(&mut store, "key2", 2);

        sleep(Duration::from_millis(100));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_ok());
    }

    #[test]
    fn test_store_key_too_long() {
        let mut store = CacheStore::new(100);
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);

        let result = store.put(long_key, artifact(1), LONG);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_store_artifact_too_large() {
        let mut store = CacheStore::new(100);
        let large = Artifact::new(vec![0u8; MAX_ARTIFACT_SIZE + 1], ArtifactFormat::Png, 1, 1);

        let result = store.put("key".to_string(), large, LONG);
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_capacity_store_refuses_writes() {
        let mut store = CacheStore::new(0);
        let result = store.put("key".to_string(), artifact(1), LONG);
        assert!(matches!(result, Err(CacheError::CacheFull(_))));
    }
}
