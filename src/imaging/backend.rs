//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify (read dimensions from the header) and resize + encode.
//! Both work on in-memory payloads; no backend touches the filesystem.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): the `image` crate for
//! decoding, resampling, JPEG and PNG, and libwebp for lossy WebP.

use super::params::EncodeParams;
use thiserror::Error;

/// Failure while turning one input payload into one output payload.
///
/// `Clone` so it can be stored on a record and copied into reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// The payload is not a decodable image.
    #[error("decode failed: {0}")]
    Decode(String),
    /// The encoder failed or produced no output.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can serve a rayon worker pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding the full pixel grid.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, TranscodeError>;

    /// Decode, resample to exactly `width`×`height`, and encode.
    fn resize(&self, params: &EncodeParams<'_>) -> Result<Vec<u8>, TranscodeError>;
}
