//! In-process artifact store.
//!
//! Splits the key space over independently locked `CacheStore` shards so
//! lookups for unrelated keys never wait on each other.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{ArtifactStore, CacheStats, CacheStore};
use crate::error::CacheError;
use crate::fingerprint::CacheKey;
use crate::imaging::Artifact;

/// Sharded in-memory [`ArtifactStore`].
#[derive(Debug)]
pub struct MemoryArtifactStore {
    shards: Vec<RwLock<CacheStore>>,
}

impl MemoryArtifactStore {
    /// Creates a store holding about `max_entries` artifacts over `shards`
    /// shards. Each shard gets `ceil(max_entries / shards)` slots.
    pub fn new(max_entries: usize, shards: usize) -> Self {
        let shards = shards.max(1);
        let per_shard = max_entries.div_ceil(shards);
        Self {
            shards: (0..shards)
                .map(|_| RwLock::new(CacheStore::new(per_shard)))
                .collect(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_for(&self, key: &CacheKey) -> &RwLock<CacheStore> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Artifact>, CacheError> {
        // Write lock: lookups update LRU order and stats
        let mut shard = self.shard_for(key).write().await;
        match shard.get(key.as_str()) {
            Ok(artifact) => Ok(Some(artifact)),
            Err(CacheError::NotFound(_)) => Ok(None),
            Err(CacheError::Expired(_)) => {
                debug!("Cache entry {} expired", key);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn put(
        &self,
        key: &CacheKey,
        artifact: Artifact,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut shard = self.shard_for(key).write().await;
        shard.put(key.as_str().to_string(), artifact, ttl)
    }

    async fn purge_expired(&self) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            removed += shard.write().await.purge_expired();
        }
        removed
    }

    async fn stats(&self) -> CacheStats {
        let mut total = CacheStats::new();
        for shard in &self.shards {
            total.merge(&shard.read().await.stats());
        }
        total
    }
}
