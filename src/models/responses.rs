//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::gateway::GatewayStats;
use crate::imaging::Artifact;

/// Response body for `POST /api/resize`
///
/// Identical for cache hits and fresh resizes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeResponse {
    /// The resized image as a `data:` URL
    pub image_data: String,
    pub width: u32,
    pub height: u32,
    /// Output encoding, e.g. "png"
    pub format: &'static str,
}

impl ResizeResponse {
    pub fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            image_data: artifact.to_data_url(),
            width: artifact.width(),
            height: artifact.height(),
            format: artifact.format().extension(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Number of entries dropped on expiry
    pub expirations: u64,
    /// Current number of cached artifacts
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Resizes performed
    pub resizes: u64,
    /// Resizes that failed or timed out
    pub resize_failures: u64,
    /// Requests turned away by the rate limiter
    pub rate_limited: u64,
    /// Cache operations that failed and were bypassed
    pub cache_errors: u64,
    /// Clients with an open rate limit window
    pub tracked_clients: usize,
}

impl StatsResponse {
    pub fn new(cache: &CacheStats, gateway: GatewayStats, tracked_clients: usize) -> Self {
        Self {
            hits: cache.hits,
            misses: cache.misses,
            evictions: cache.evictions,
            expirations: cache.expirations,
            total_entries: cache.total_entries,
            hit_rate: cache.hit_rate(),
            resizes: gateway.resizes,
            resize_failures: gateway.resize_failures,
            rate_limited: gateway.rate_limited,
            cache_errors: gateway.cache_errors,
            tracked_clients,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
