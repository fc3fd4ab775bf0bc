//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::imaging::ResizeOptions;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of artifacts the cache can hold
    pub max_entries: usize,
    /// Number of independently locked cache shards
    pub cache_shards: usize,
    /// TTL in seconds applied to every cached artifact
    pub cache_ttl: u64,
    /// Requests admitted per client per window
    pub rate_limit_max_requests: u32,
    /// Rate limit window length in seconds
    pub rate_limit_window: u64,
    /// Upper bound on a single resize, in milliseconds
    pub resize_timeout_ms: u64,
    /// Maximum accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Favour output fidelity over speed and size
    pub preserve_quality: bool,
    /// Interpolate when resampling instead of nearest-neighbour
    pub smooth_edges: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_ENTRIES` - Maximum cached artifacts (default: 1000)
    /// - `CACHE_SHARDS` - Cache shard count (default: 16)
    /// - `CACHE_TTL` - Artifact TTL in seconds (default: 604800, 7 days)
    /// - `RATE_LIMIT_MAX_REQUESTS` - Requests per window (default: 10)
    /// - `RATE_LIMIT_WINDOW` - Window length in seconds (default: 60)
    /// - `RESIZE_TIMEOUT_MS` - Resize time bound (default: 10000)
    /// - `MAX_UPLOAD_BYTES` - Request body limit (default: 20 MiB)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 30)
    /// - `PRESERVE_QUALITY` - Engine quality flag (default: true)
    /// - `SMOOTH_EDGES` - Engine smoothing flag (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            cache_shards: env_or("CACHE_SHARDS", defaults.cache_shards).max(1),
            cache_ttl: env_or("CACHE_TTL", defaults.cache_ttl),
            rate_limit_max_requests: env_or(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            ),
            rate_limit_window: env_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window),
            resize_timeout_ms: env_or("RESIZE_TIMEOUT_MS", defaults.resize_timeout_ms),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            preserve_quality: env_or("PRESERVE_QUALITY", defaults.preserve_quality),
            smooth_edges: env_or("SMOOTH_EDGES", defaults.smooth_edges),
        }
    }

    /// Artifact time-to-live as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Rate limit window as a Duration.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window)
    }

    /// Resize time bound as a Duration.
    pub fn resize_timeout(&self) -> Duration {
        Duration::from_millis(self.resize_timeout_ms)
    }

    /// Engine options applied to every request.
    pub fn resize_options(&self) -> ResizeOptions {
        ResizeOptions {
            preserve_quality: self.preserve_quality,
            smooth_edges: self.smooth_edges,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            max_entries: 1000,
            cache_shards: 16,
            cache_ttl: 7 * 24 * 60 * 60,
            rate_limit_max_requests: 10,
            rate_limit_window: 60,
            resize_timeout_ms: 10_000,
            max_upload_bytes: 20 * 1024 * 1024,
            cleanup_interval: 30,
            preserve_quality: true,
            smooth_edges: true,
        }
    }
}

/// Reads and parses an environment variable, falling back to `default`
/// when it is unset or does not parse.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
