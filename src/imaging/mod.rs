//! Imaging Module
//!
//! The resize engine interface, its options, and the artifact it produces.

mod artifact;
mod engine;

pub use artifact::{Artifact, ArtifactFormat};
pub use engine::ImageResizer;

use crate::error::ResizeError;

// == Resize Options ==
/// Quality and filtering trade-offs for a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    /// Higher-order filter and lighter compression when true
    pub preserve_quality: bool,
    /// Interpolating filter when true, nearest-neighbour when false
    pub smooth_edges: bool,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            preserve_quality: true,
            smooth_edges: true,
        }
    }
}

// == Resize Engine ==
/// Produces a resized artifact from an encoded source image.
///
/// Implementations are CPU-bound and synchronous; callers run them off the
/// async executor. Output dimensions are exactly `width` x `height`, with no
/// aspect-ratio correction.
pub trait ResizeEngine: Send + Sync {
    fn resize(
        &self,
        source_image: &[u8],
        width: u32,
        height: u32,
        options: ResizeOptions,
    ) -> Result<Artifact, ResizeError>;
}
