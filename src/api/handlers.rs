//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::ClientId;
use crate::cache::MemoryArtifactStore;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::gateway::{run_blocking, GatewayPolicy, ResizeGateway};
use crate::imaging::ImageResizer;
use crate::models::{HealthResponse, ResizeRequestBody, ResizeResponse, StatsResponse};
use crate::ratelimit::FixedWindowLimiter;

/// Response header reporting how the cache took part.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ResizeGateway>,
    /// Request body ceiling in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Creates a new AppState around an assembled gateway.
    pub fn new(gateway: ResizeGateway, max_upload_bytes: usize) -> Self {
        Self {
            gateway: Arc::new(gateway),
            max_upload_bytes,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Wires the in-memory cache, the fixed window limiter and the image
    /// engine with the configured policy.
    pub fn from_config(config: &Config) -> Self {
        let cache = MemoryArtifactStore::new(config.max_entries, config.cache_shards);
        let limiter =
            FixedWindowLimiter::new(config.rate_limit_max_requests, config.rate_limit_window());
        let gateway = ResizeGateway::new(
            Arc::new(limiter),
            Arc::new(cache),
            Arc::new(ImageResizer::new()),
            GatewayPolicy::from(config),
        );
        Self::new(gateway, config.max_upload_bytes)
    }
}

/// Handler for POST /api/resize
///
/// Resizes the posted image, serving from cache when possible. Base64
/// decoding of the upload and encoding of the result run on the blocking
/// pool.
pub async fn resize_handler(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    body: std::result::Result<Json<ResizeRequestBody>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Ok(rejection.into_response());
        }
        Err(rejection) => return Err(GatewayError::invalid("body", rejection.body_text())),
    };

    let request = run_blocking("request decode", move || body.into_request(client_id)).await??;
    let outcome = state.gateway.handle(request).await?;

    let cache_status = outcome.cache_status;
    let artifact = outcome.artifact;
    let response =
        run_blocking("response encode", move || ResizeResponse::from_artifact(&artifact)).await?;

    Ok(([(X_CACHE, cache_status.as_str())], Json(response)).into_response())
}

/// Handler for GET /stats
///
/// Returns cache statistics and gateway counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let gateway = &state.gateway;
    let cache = gateway.cache().stats().await;
    let tracked_clients = gateway.limiter().tracked_clients().await;

    Json(StatsResponse::new(&cache, gateway.stats(), tracked_clients))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
