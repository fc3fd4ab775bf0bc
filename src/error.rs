//! Error types for the resize gateway
//!
//! Provides layered error handling using thiserror: store errors, engine
//! errors, and the gateway taxonomy that maps onto HTTP responses.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned to callers for failures whose cause is not theirs to see.
const GENERIC_FAILURE: &str = "Failed to process image";

// == Cache Error Enum ==
/// Errors raised by the cache store and the artifact store interface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key has expired
    #[error("Key expired: {0}")]
    Expired(String),

    /// Key or value rejected by the store
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Backing store could not be reached
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

// == Resize Error Enum ==
/// Errors raised by a resize engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResizeError {
    /// Payload is not a recognizable image encoding
    #[error("Could not decode image: {0}")]
    Decode(String),

    /// Format recognized but not handled by the engine
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Resampled image could not be encoded
    #[error("Could not encode image: {0}")]
    Encode(String),
}

// == Gateway Error Enum ==
/// Outcome of a rejected or failed resize request.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Malformed request; names the offending field
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Client exhausted its request budget
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after: Option<Duration> },

    /// Payload is not a recognizable image encoding
    #[error("Could not decode image: {0}")]
    Decode(String),

    /// Payload format is recognized but not handled
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Cache backend failed and the caller chose not to degrade.
    ///
    /// [`ResizeGateway`](crate::gateway::ResizeGateway) never returns this;
    /// it logs store failures and resizes without the cache. There is no
    /// `From<CacheError>` so a store error cannot become a 500 through `?`.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(CacheError),

    /// Resize did not finish within the configured bound
    #[error("Resize timed out after {0:?}")]
    ResizeTimeout(Duration),

    /// Unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Shorthand for a validation failure on `field`.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        GatewayError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

impl From<ResizeError> for GatewayError {
    fn from(err: ResizeError) -> Self {
        match err {
            ResizeError::Decode(msg) => GatewayError::Decode(msg),
            ResizeError::UnsupportedFormat(format) => GatewayError::UnsupportedFormat(format),
            ResizeError::Encode(msg) => GatewayError::Internal(format!("encode failed: {msg}")),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::InvalidInput { field, ref reason } => {
                let body = Json(json!({
                    "error": format!("Invalid {field}: {reason}"),
                    "field": field,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            GatewayError::RateLimited { retry_after } => {
                let body = Json(json!({ "error": self.to_string() }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                if let Some(delay) = retry_after {
                    let secs = retry_after_secs(delay);
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                }
                response
            }
            GatewayError::Decode(_) => {
                let body = Json(json!({ "error": self.to_string() }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            GatewayError::UnsupportedFormat(_) => {
                let body = Json(json!({ "error": self.to_string() }));
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, body).into_response()
            }
            GatewayError::ResizeTimeout(_) => {
                error!("{}", self);
                let body = Json(json!({ "error": "Image processing timed out" }));
                (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
            }
            GatewayError::CacheUnavailable(_) | GatewayError::Internal(_) => {
                error!("Error processing image: {}", self);
                let body = Json(json!({ "error": GENERIC_FAILURE }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

/// Whole seconds to advertise in `Retry-After`, never less than one.
fn retry_after_secs(delay: Duration) -> u64 {
    let secs = delay.as_secs() + u64::from(delay.subsec_nanos() > 0);
    secs.max(1)
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, GatewayError>;
