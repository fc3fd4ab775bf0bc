//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming HTTP request bodies.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::gateway::{ResizeRequest, MAX_DIMENSION, MIN_DIMENSION};

/// Request body for `POST /api/resize`
///
/// # Fields
/// - `imageData`: the source image, as bare base64 or a `data:` URL
/// - `width`, `height`: target size in pixels
///
/// Dimensions are taken as raw JSON values so that missing, fractional,
/// string or oversized values are reported by field name rather than as a
/// malformed body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeRequestBody {
    pub image_data: String,
    #[serde(default)]
    pub width: Value,
    #[serde(default)]
    pub height: Value,
}

impl ResizeRequestBody {
    /// Decodes the payload and attaches the caller's identity.
    ///
    /// Base64 decoding is proportional to the upload size; callers on the
    /// async runtime should run this on the blocking pool.
    pub fn into_request(self, client_id: String) -> Result<ResizeRequest> {
        let target_width = parse_dimension("width", &self.width)?;
        let target_height = parse_dimension("height", &self.height)?;
        let source_image = decode_image_data(&self.image_data)?;
        Ok(ResizeRequest {
            source_image: source_image.into(),
            target_width,
            target_height,
            client_id,
        })
    }
}

/// Accepts any JSON integer; the range itself is checked by
/// [`ResizeRequest::validate`].
fn parse_dimension(field: &'static str, value: &Value) -> Result<i64> {
    let expected = || {
        format!(
            "must be an integer between {} and {}",
            MIN_DIMENSION, MAX_DIMENSION
        )
    };
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| GatewayError::invalid(field, format!("{}, got {}", expected(), n))),
        Value::Null => Err(GatewayError::invalid(field, "is required")),
        other => Err(GatewayError::invalid(
            field,
            format!("{}, got {}", expected(), other),
        )),
    }
}

/// Accepts `data:<mime>;base64,<payload>` or bare base64.
fn decode_image_data(image_data: &str) -> Result<Vec<u8>> {
    let payload = match image_data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| GatewayError::invalid("imageData", "malformed data URL"))?;
            if !header.ends_with(";base64") {
                return Err(GatewayError::invalid(
                    "imageData",
                    "data URL must be base64 encoded",
                ));
            }
            payload
        }
        None => image_data,
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|e| GatewayError::invalid("imageData", format!("invalid base64: {}", e)))
}
