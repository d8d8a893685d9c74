//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a settings snapshot, compute parameters, and call the backend.

use super::backend::{ImageBackend, TranscodeError};
use super::calculations::{compute_target_dimensions, savings_percent};
use super::codec::{OutputFormat, output_name};
use super::params::EncodeParams;
use crate::config::Settings;
use crate::registry::{ImageId, ImageRecord};
use std::sync::Arc;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, TranscodeError>;

/// Output of transcoding one record. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedResult {
    /// Record this result belongs to.
    pub id: ImageId,
    /// Output file name (original base name + format extension).
    pub name: String,
    pub original_size: u64,
    /// Encoded payload size in bytes.
    pub size: u64,
    pub original_width: u32,
    pub original_height: u32,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub data: Arc<[u8]>,
}

impl ProcessedResult {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn savings_percent(&self) -> f64 {
        savings_percent(self.original_size, self.size)
    }
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &[u8]) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// Plan an encode without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_encode<'a>(
    source: &'a [u8],
    original_dims: (u32, u32),
    settings: &Settings,
) -> EncodeParams<'a> {
    let (width, height) =
        compute_target_dimensions(original_dims, settings.max_width, settings.max_height);
    EncodeParams {
        source,
        width,
        height,
        format: settings.format,
        quality: settings.quality,
    }
}

/// Decode, resize and re-encode one record with the given settings.
///
/// The record is not modified; attaching the result is the caller's job.
pub fn transcode(
    backend: &impl ImageBackend,
    record: &ImageRecord,
    settings: &Settings,
) -> Result<ProcessedResult> {
    let original_dims = get_dimensions(backend, &record.data)?;
    let params = plan_encode(&record.data, original_dims, settings);
    let encoded = backend.resize(&params)?;
    if encoded.is_empty() {
        return Err(TranscodeError::Encode(format!(
            "{} encoder produced no output",
            params.format
        )));
    }

    Ok(ProcessedResult {
        id: record.id.clone(),
        name: output_name(&record.name, settings.format),
        original_size: record.size,
        size: encoded.len() as u64,
        original_width: original_dims.0,
        original_height: original_dims.1,
        width: params.width,
        height: params.height,
        format: settings.format,
        data: encoded.into(),
    })
}
