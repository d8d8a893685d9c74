//! Image processing: decode, resize, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize** | `DynamicImage::resize_exact` (Lanczos3) |
//! | **Encode** | `image` (JPEG, PNG) + `webp` (lossy WebP) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Codec**: Output format names, MIME types, file naming
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`transcode`], combining calculations + backend

pub mod backend;
mod calculations;
pub mod codec;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{Dimensions, ImageBackend, TranscodeError};
pub use calculations::{compute_target_dimensions, savings_percent};
pub use codec::{OutputFormat, UnknownFormat, mime_for, output_name, quality_fraction, split_extension};
pub use operations::{ProcessedResult, get_dimensions, plan_encode, transcode};
pub use params::{EncodeParams, Quality};
pub use rust_backend::RustBackend;
