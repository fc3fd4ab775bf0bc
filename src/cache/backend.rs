//! Artifact Store Interface
//!
//! The narrow get/put seam the gateway depends on. Any key-value backend
//! with per-entry expiry can sit behind it.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::CacheStats;
use crate::error::CacheError;
use crate::fingerprint::CacheKey;
use crate::imaging::Artifact;

/// Content-addressed artifact storage with per-entry TTL.
///
/// `get` returns `Ok(None)` for absent and expired keys. An `Err` means the
/// backend itself failed.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Artifact>, CacheError>;

    async fn put(&self, key: &CacheKey, artifact: Artifact, ttl: Duration)
        -> Result<(), CacheError>;

    /// Drops expired entries, returning how many were removed. Backends that
    /// expire on their own can keep the default.
    async fn purge_expired(&self) -> usize {
        0
    }

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}
