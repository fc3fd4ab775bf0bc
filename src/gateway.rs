//! Resize Gateway
//!
//! Transport-agnostic request handling: validate, check the client's rate
//! limit, look up the fingerprint, resize on a miss and cache the result.
//!
//! Rate limiter state and cache contents are the only things a request
//! mutates. Validation and rate-limit rejections happen before any cache or
//! resize work; a failed resize never writes to the cache; a failing cache
//! is logged and bypassed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::ArtifactStore;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::fingerprint::{fingerprint, CacheKey};
use crate::imaging::{Artifact, ResizeEngine, ResizeOptions};
use crate::ratelimit::RateLimiter;

/// Smallest accepted target dimension, in pixels.
pub const MIN_DIMENSION: i64 = 1;
/// Largest accepted target dimension, in pixels.
pub const MAX_DIMENSION: i64 = 2000;

// == Request ==
/// A single resize request as received from a caller.
#[derive(Debug, Clone)]
pub struct ResizeRequest {
    pub source_image: Arc<[u8]>,
    pub target_width: i64,
    pub target_height: i64,
    pub client_id: String,
}

impl ResizeRequest {
    /// Checks payload and dimensions, returning the dimensions as pixels.
    pub fn validate(&self) -> Result<(u32, u32)> {
        if self.source_image.is_empty() {
            return Err(GatewayError::invalid("imageData", "image payload is empty"));
        }
        let width = validate_dimension("width", self.target_width)?;
        let height = validate_dimension("height", self.target_height)?;
        Ok((width, height))
    }
}

fn validate_dimension(field: &'static str, value: i64) -> Result<u32> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
        return Err(GatewayError::invalid(
            field,
            format!(
                "must be between {} and {}, got {}",
                MIN_DIMENSION, MAX_DIMENSION, value
            ),
        ));
    }
    // Range-checked above
    Ok(value as u32)
}

/// Runs CPU-bound work proportional to the payload size on the blocking pool.
pub(crate) async fn run_blocking<T, F>(task: &'static str, work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| GatewayError::Internal(format!("{} task failed: {}", task, e)))
}

// == Outcome ==
/// How the cache took part in answering a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Served from cache without resizing
    Hit,
    /// Resized and stored
    Miss,
    /// Cache failed; resized without it
    Bypass,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }
}

/// A successfully answered request.
#[derive(Debug, Clone)]
pub struct ResizeOutcome {
    pub artifact: Artifact,
    pub cache_status: CacheStatus,
}

// == Policy ==
/// Fixed per-process knobs for request handling.
#[derive(Debug, Clone, Copy)]
pub struct GatewayPolicy {
    /// Lifetime of cached artifacts
    pub cache_ttl: Duration,
    /// Upper bound on one resize
    pub resize_timeout: Duration,
    /// Engine options applied to every resize
    pub options: ResizeOptions,
}

impl Default for GatewayPolicy {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            resize_timeout: Duration::from_secs(10),
            options: ResizeOptions::default(),
        }
    }
}

impl From<&Config> for GatewayPolicy {
    fn from(config: &Config) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            resize_timeout: config.resize_timeout(),
            options: config.resize_options(),
        }
    }
}

// == Counters ==
/// Gateway-level counters, complementing the store's own statistics.
#[derive(Debug, Default)]
struct Counters {
    resizes: AtomicU64,
    resize_failures: AtomicU64,
    rate_limited: AtomicU64,
    cache_errors: AtomicU64,
}

/// Snapshot of the gateway counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
    pub resizes: u64,
    pub resize_failures: u64,
    pub rate_limited: u64,
    pub cache_errors: u64,
}

// == Gateway ==
/// Orchestrates one resize request end to end.
pub struct ResizeGateway {
    limiter: Arc<dyn RateLimiter>,
    cache: Arc<dyn ArtifactStore>,
    engine: Arc<dyn ResizeEngine>,
    policy: GatewayPolicy,
    counters: Counters,
}

impl ResizeGateway {
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        cache: Arc<dyn ArtifactStore>,
        engine: Arc<dyn ResizeEngine>,
        policy: GatewayPolicy,
    ) -> Self {
        Self {
            limiter,
            cache,
            engine,
            policy,
            counters: Counters::default(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn ArtifactStore> {
        &self.cache
    }

    pub fn limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.limiter
    }

    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            resizes: self.counters.resizes.load(Ordering::Relaxed),
            resize_failures: self.counters.resize_failures.load(Ordering::Relaxed),
            rate_limited: self.counters.rate_limited.load(Ordering::Relaxed),
            cache_errors: self.counters.cache_errors.load(Ordering::Relaxed),
        }
    }

    /// Answers a resize request.
    pub async fn handle(&self, request: ResizeRequest) -> Result<ResizeOutcome> {
        let (width, height) = request.validate()?;

        let decision = self.limiter.allow(&request.client_id).await;
        if !decision.permitted {
            self.counters.rate_limited.fetch_add(1, Ordering::Relaxed);
            return Err(GatewayError::RateLimited {
                retry_after: decision.retry_after,
            });
        }

        let source = request.source_image.clone();
        let key =
            run_blocking("fingerprint", move || fingerprint(&source, width, height)).await?;

        let cache_status = match self.cache.get(&key).await {
            Ok(Some(artifact)) => {
                debug!("Cache hit for {} ({}x{})", key, width, height);
                return Ok(ResizeOutcome {
                    artifact,
                    cache_status: CacheStatus::Hit,
                });
            }
            Ok(None) => {
                debug!("Cache miss for {} ({}x{})", key, width, height);
                CacheStatus::Miss
            }
            Err(e) => {
                self.counters.cache_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Cache lookup failed for {}, resizing without cache: {}", key, e);
                CacheStatus::Bypass
            }
        };

        let artifact = match self.resize(request.source_image, width, height).await {
            Ok(artifact) => artifact,
            Err(e) => {
                self.counters.resize_failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        self.store(&key, &artifact).await;

        Ok(ResizeOutcome {
            artifact,
            cache_status,
        })
    }

    /// Runs the engine on the blocking pool, bounded by the policy timeout.
    ///
    /// On timeout the blocking task is left to finish on its own; its result
    /// is discarded.
    async fn resize(&self, source: Arc<[u8]>, width: u32, height: u32) -> Result<Artifact> {
        let engine = self.engine.clone();
        let options = self.policy.options;
        let task =
            tokio::task::spawn_blocking(move || engine.resize(&source, width, height, options));

        let artifact = match tokio::time::timeout(self.policy.resize_timeout, task).await {
            Err(_) => return Err(GatewayError::ResizeTimeout(self.policy.resize_timeout)),
            Ok(Err(join_error)) => {
                return Err(GatewayError::Internal(format!(
                    "resize task failed: {}",
                    join_error
                )))
            }
            Ok(Ok(result)) => result?,
        };

        self.counters.resizes.fetch_add(1, Ordering::Relaxed);
        Ok(artifact)
    }

    async fn store(&self, key: &CacheKey, artifact: &Artifact) {
        if let Err(e) = self
            .cache
            .put(key, artifact.clone(), self.policy.cache_ttl)
            .await
        {
            self.counters.cache_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Failed to cache artifact {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStats, MemoryArtifactStore};
    use crate::error::{CacheError, ResizeError};
    use crate::imaging::{ArtifactFormat, ImageResizer};
    use crate::ratelimit::FixedWindowLimiter;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::AtomicUsize;

    /// Wraps an engine and counts invocations.
    struct CountingEngine<E> {
        inner: E,
        calls: AtomicUsize,
    }

    impl<E> CountingEngine<E> {
        fn new(inner: E) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl<E: ResizeEngine> ResizeEngine for CountingEngine<E> {
        fn resize(
            &self,
            source_image: &[u8],
            width: u32,
            height: u32,
            options: ResizeOptions,
        ) -> std::result::Result<Artifact, ResizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resize(source_image, width, height, options)
        }
    }

    /// Always fails to decode.
    struct BrokenEngine;

    impl ResizeEngine for BrokenEngine {
        fn resize(
            &self,
            _source_image: &[u8],
            _width: u32,
            _height: u32,
            _options: ResizeOptions,
        ) -> std::result::Result<Artifact, ResizeError> {
            Err(ResizeError::Decode("corrupt".to_string()))
        }
    }

    /// Blocks longer than any test timeout.
    struct SlowEngine;

    impl ResizeEngine for SlowEngine {
        fn resize(
            &self,
            _source_image: &[u8],
            width: u32,
            height: u32,
            _options: ResizeOptions,
        ) -> std::result::Result<Artifact, ResizeError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(Artifact::new(vec![0u8], ArtifactFormat::Png, width, height))
        }
    }

    /// A store whose backend is always down.
    struct UnreachableStore;

    #[async_trait]
    impl ArtifactStore for UnreachableStore {
        async fn get(&self, _key: &CacheKey) -> std::result::Result<Option<Artifact>, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn put(
            &self,
            _key: &CacheKey,
            _artifact: Artifact,
            _ttl: Duration,
        ) -> std::result::Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn stats(&self) -> CacheStats {
            CacheStats::default()
        }
    }

    fn png_fixture(width: u32, height: u32) -> Arc<[u8]> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer.into()
    }

    fn request(source: &Arc<[u8]>, width: i64, height: i64, client: &str) -> ResizeRequest {
        ResizeRequest {
            source_image: source.clone(),
            target_width: width,
            target_height: height,
            client_id: client.to_string(),
        }
    }

    /// Cheap filters and a generous bound keep 2000px cases quick in debug builds.
    fn test_policy() -> GatewayPolicy {
        GatewayPolicy {
            resize_timeout: Duration::from_secs(120),
            options: ResizeOptions {
                preserve_quality: false,
                smooth_edges: false,
            },
            ..GatewayPolicy::default()
        }
    }

    fn gateway_with<E: ResizeEngine + 'static>(
        engine: Arc<E>,
        cache: Arc<dyn ArtifactStore>,
        limit: u32,
    ) -> ResizeGateway {
        ResizeGateway::new(
            Arc::new(FixedWindowLimiter::new(limit, Duration::from_secs(60))),
            cache,
            engine,
            test_policy(),
        )
    }

    fn gateway_with_fresh_cache<E: ResizeEngine + 'static>(
        engine: Arc<E>,
        limit: u32,
    ) -> ResizeGateway {
        gateway_with(engine, Arc::new(MemoryArtifactStore::new(100, 4)), limit)
    }

    #[tokio::test]
    async fn test_miss_then_hit_skips_resize() {
        let engine = Arc::new(CountingEngine::new(ImageResizer::new()));
        let gateway = gateway_with_fresh_cache(engine.clone(), 10);
        let source = png_fixture(400, 300);

        let first = gateway.handle(request(&source, 64, 64, "c1")).await.unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);
        assert_eq!((first.artifact.width(), first.artifact.height()), (64, 64));
        let decoded = image::load_from_memory(first.artifact.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));

        let second = gateway.handle(request(&source, 64, 64, "c2")).await.unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.artifact.bytes(), first.artifact.bytes());
        assert_eq!(engine.calls(), 1);
        assert_eq!(gateway.stats().resizes, 1);
    }

    #[tokio::test]
    async fn test_different_dimensions_are_separate_entries() {
        let engine = Arc::new(CountingEngine::new(ImageResizer::new()));
        let gateway = gateway_with_fresh_cache(engine.clone(), 10);
        let source = png_fixture(50, 50);

        gateway.handle(request(&source, 10, 20, "c1")).await.unwrap();
        let other = gateway.handle(request(&source, 20, 10, "c1")).await.unwrap();

        assert_eq!(other.cache_status, CacheStatus::Miss);
        assert_eq!((other.artifact.width(), other.artifact.height()), (20, 10));
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_dimension_validation() {
        let engine = Arc::new(CountingEngine::new(ImageResizer::new()));
        let gateway = gateway_with_fresh_cache(engine.clone(), 100);
        let source = png_fixture(8, 8);

        for (w, h, field) in [(0, 10, "width"), (2001, 10, "width"), (10, -3, "height")] {
            let err = gateway.handle(request(&source, w, h, "c1")).await.unwrap_err();
            match err {
                GatewayError::InvalidInput { field: f, .. } => assert_eq!(f, field),
                other => panic!("expected InvalidInput, got {:?}", other),
            }
        }

        let empty: Arc<[u8]> = Vec::new().into();
        let err = gateway.handle(request(&empty, 10, 10, "c1")).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput { field: "imageData", .. }));

        assert!(gateway.handle(request(&source, 1, 1, "c1")).await.is_ok());
        assert!(gateway.handle(request(&source, 2000, 2000, "c1")).await.is_ok());
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_requests_do_not_consume_budget() {
        let engine = Arc::new(ImageResizer::new());
        let gateway = gateway_with_fresh_cache(engine, 1);
        let source = png_fixture(8, 8);

        for _ in 0..5 {
            let _ = gateway.handle(request(&source, 0, 0, "c1")).await;
        }

        assert!(gateway.handle(request(&source, 4, 4, "c1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_short_circuits_before_cache_and_resize() {
        let engine = Arc::new(CountingEngine::new(ImageResizer::new()));
        let cache = Arc::new(MemoryArtifactStore::new(100, 4));
        let gateway = gateway_with(engine.clone(), cache.clone(), 10);
        let source = png_fixture(16, 16);

        for _ in 0..10 {
            gateway.handle(request(&source, 8, 8, "c1")).await.unwrap();
        }
        let lookups_before = cache.stats().await;

        let err = gateway.handle(request(&source, 8, 8, "c1")).await.unwrap_err();
        match err {
            GatewayError::RateLimited { retry_after } => assert!(retry_after.is_some()),
            other => panic!("expected RateLimited, got {:?}", other),
        }

        let lookups_after = cache.stats().await;
        assert_eq!(
            lookups_before.hits + lookups_before.misses,
            lookups_after.hits + lookups_after.misses
        );
        assert_eq!(engine.calls(), 1);
        assert_eq!(gateway.stats().rate_limited, 1);
    }

    #[tokio::test]
    async fn test_failures_are_never_cached() {
        let cache = Arc::new(MemoryArtifactStore::new(100, 4));
        let broken = gateway_with(Arc::new(BrokenEngine), cache.clone(), 10);
        let source = png_fixture(16, 16);

        let err = broken.handle(request(&source, 8, 8, "c1")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
        assert_eq!(cache.stats().await.total_entries, 0);

        // A working engine sharing the same cache re-attempts the resize
        let engine = Arc::new(CountingEngine::new(ImageResizer::new()));
        let working = gateway_with(engine.clone(), cache.clone(), 10);
        let outcome = working.handle(request(&source, 8, 8, "c1")).await.unwrap();
        assert_eq!(outcome.cache_status, CacheStatus::Miss);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_payload() {
        let gateway = gateway_with_fresh_cache(Arc::new(ImageResizer::new()), 10);
        let garbage: Arc<[u8]> = b"hello, world".to_vec().into();

        let err = gateway.handle(request(&garbage, 8, 8, "c1")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
        assert_eq!(gateway.stats().resize_failures, 1);
    }

    #[tokio::test]
    async fn test_cache_outage_degrades_to_resize() {
        let engine = Arc::new(CountingEngine::new(ImageResizer::new()));
        let gateway = gateway_with(engine.clone(), Arc::new(UnreachableStore), 10);
        let source = png_fixture(32, 32);

        let first = gateway.handle(request(&source, 16, 16, "c1")).await.unwrap();
        let second = gateway.handle(request(&source, 16, 16, "c1")).await.unwrap();

        assert_eq!(first.cache_status, CacheStatus::Bypass);
        assert_eq!(second.cache_status, CacheStatus::Bypass);
        assert_eq!(first.artifact.bytes(), second.artifact.bytes());
        assert_eq!(engine.calls(), 2);
        assert_eq!(gateway.stats().cache_errors, 4);
    }

    #[tokio::test]
    async fn test_slow_resize_times_out_and_is_not_cached() {
        let cache = Arc::new(MemoryArtifactStore::new(100, 4));
        let gateway = ResizeGateway::new(
            Arc::new(FixedWindowLimiter::new(10, Duration::from_secs(60))),
            cache.clone(),
            Arc::new(SlowEngine),
            GatewayPolicy {
                resize_timeout: Duration::from_millis(50),
                ..GatewayPolicy::default()
            },
        );
        let source = png_fixture(8, 8);

        let err = gateway.handle(request(&source, 4, 4, "c1")).await.unwrap_err();
        assert!(matches!(err, GatewayError::ResizeTimeout(_)));
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_expired_artifact_is_recomputed() {
        let engine = Arc::new(CountingEngine::new(ImageResizer::new()));
        let gateway = ResizeGateway::new(
            Arc::new(FixedWindowLimiter::new(10, Duration::from_secs(60))),
            Arc::new(MemoryArtifactStore::new(100, 4)),
            engine.clone(),
            GatewayPolicy {
                cache_ttl: Duration::from_millis(100),
                ..test_policy()
            },
        );
        let source = png_fixture(8, 8);

        gateway.handle(request(&source, 4, 4, "c1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        let outcome = gateway.handle(request(&source, 4, 4, "c1")).await.unwrap();

        assert_eq!(outcome.cache_status, CacheStatus::Miss);
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_blocking_work_leaves_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let worker = run_blocking("thread id", || std::thread::current().id())
            .await
            .unwrap();
        assert_ne!(worker, runtime_thread);
    }

    #[tokio::test]
    async fn test_blocking_panic_is_internal_error() {
        let result: Result<()> = run_blocking("explode", || panic!("boom")).await;
        assert!(matches!(result, Err(GatewayError::Internal(_))));
    }
}
