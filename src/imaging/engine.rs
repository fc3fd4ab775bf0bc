//! Image-crate resize engine.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Sniff format | `image::guess_format` (magic bytes) |
//! | Decode | `image::ImageReader` with allocation limits |
//! | Resample | `DynamicImage::resize_exact` |
//! | Encode | `JpegEncoder` for JPEG sources, `PngEncoder` otherwise |

use std::borrow::Cow;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use tracing::debug;

use super::{Artifact, ArtifactFormat, ResizeEngine, ResizeOptions};
use crate::error::ResizeError;

/// Formats whose decoders are compiled in.
const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// Decoder allocation ceiling.
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

const JPEG_QUALITY_HIGH: u8 = 92;
const JPEG_QUALITY_FAST: u8 = 75;

/// Engine backed by the `image` crate's pure Rust codecs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer;

impl ImageResizer {
    pub fn new() -> Self {
        Self
    }
}

impl ResizeEngine for ImageResizer {
    fn resize(
        &self,
        source_image: &[u8],
        width: u32,
        height: u32,
        options: ResizeOptions,
    ) -> Result<Artifact, ResizeError> {
        let format = detect_format(source_image)?;
        let image = decode(source_image, format)?;
        debug!(
            "Resizing {:?} {}x{} -> {}x{}",
            format,
            image.width(),
            image.height(),
            width,
            height
        );

        let resized = image.resize_exact(width, height, filter_for(options));

        let (bytes, output) = match format {
            ImageFormat::Jpeg => (encode_jpeg(&resized, options)?, ArtifactFormat::Jpeg),
            _ => (encode_png(&resized, options)?, ArtifactFormat::Png),
        };

        Ok(Artifact::new(bytes, output, resized.width(), resized.height()))
    }
}

/// Sniffs the encoding from magic bytes and checks it is one we decode.
fn detect_format(source_image: &[u8]) -> Result<ImageFormat, ResizeError> {
    let format = image::guess_format(source_image)
        .map_err(|_| ResizeError::Decode("unrecognized image encoding".to_string()))?;
    if SUPPORTED_FORMATS.contains(&format) {
        Ok(format)
    } else {
        Err(ResizeError::UnsupportedFormat(format!("{:?}", format)))
    }
}

fn decode(source_image: &[u8], format: ImageFormat) -> Result<DynamicImage, ResizeError> {
    let mut limits = Limits::default();
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut reader = ImageReader::with_format(Cursor::new(source_image), format);
    reader.limits(limits);
    reader
        .decode()
        .map_err(|e| ResizeError::Decode(format!("{:?}: {}", format, e)))
}

/// Nearest-neighbour unless smoothing is requested; Lanczos3 when quality
/// also matters, bilinear otherwise.
fn filter_for(options: ResizeOptions) -> FilterType {
    match (options.smooth_edges, options.preserve_quality) {
        (false, _) => FilterType::Nearest,
        (true, true) => FilterType::Lanczos3,
        (true, false) => FilterType::Triangle,
    }
}

fn encode_jpeg(image: &DynamicImage, options: ResizeOptions) -> Result<Vec<u8>, ResizeError> {
    let quality = if options.preserve_quality {
        JPEG_QUALITY_HIGH
    } else {
        JPEG_QUALITY_FAST
    };
    // JPEG carries no alpha channel
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut buffer = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
        .map_err(|e| ResizeError::Encode(e.to_string()))?;
    Ok(buffer)
}

fn encode_png(image: &DynamicImage, options: ResizeOptions) -> Result<Vec<u8>, ResizeError> {
    let compression = if options.preserve_quality {
        CompressionType::Best
    } else {
        CompressionType::Fast
    };

    let image: Cow<'_, DynamicImage> = match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => Cow::Borrowed(image),
        other if other.color().has_alpha() => {
            Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8()))
        }
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    };

    let mut buffer = Vec::new();
    image
        .write_with_encoder(PngEncoder::new_with_quality(
            &mut buffer,
            compression,
            PngFilter::Adaptive,
        ))
        .map_err(|e| ResizeError::Encode(e.to_string()))?;
    Ok(buffer)
}
