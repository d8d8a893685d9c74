//! Production image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageDecoder::dimensions` (header only) |
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | EXIF orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless) |
//! | Encode → WebP | `webp` crate (libwebp, lossy) |

use super::backend::{Dimensions, ImageBackend, TranscodeError};
use super::codec::OutputFormat;
use super::params::{EncodeParams, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Backend using the `image` crate ecosystem plus libwebp.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, TranscodeError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| TranscodeError::Decode(format!("unreadable payload: {e}")))
}

fn decoder(source: &[u8]) -> Result<impl ImageDecoder + '_, TranscodeError> {
    reader(source)?
        .into_decoder()
        .map_err(|e| TranscodeError::Decode(e.to_string()))
}

/// Orientation declared in the payload's metadata. Missing or unreadable
/// metadata means the pixels are stored upright.
fn orientation_of(decoder: &mut impl ImageDecoder) -> Orientation {
    decoder.orientation().unwrap_or(Orientation::NoTransforms)
}

fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Decode a full image from memory, turned upright per its EXIF orientation.
fn load_image(source: &[u8]) -> Result<DynamicImage, TranscodeError> {
    let mut decoder = decoder(source)?;
    let orientation = orientation_of(&mut decoder);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| TranscodeError::Decode(e.to_string()))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Composite onto black using straight alpha.
fn flatten_alpha(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
        image::Rgb([scale(r), scale(g), scale(b)])
    })
}

/// Encode a pixel grid in the requested format.
fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, TranscodeError> {
    let encoded = match format {
        OutputFormat::WebP => encode_webp(img, quality)?,
        OutputFormat::Jpeg => encode_jpeg(img, quality)?,
        OutputFormat::Png => encode_png(img)?,
    };
    if encoded.is_empty() {
        return Err(TranscodeError::Encode(format!(
            "{format} encoder produced no output"
        )));
    }
    Ok(encoded)
}

/// Transparent pixels are composited onto black, as a browser canvas does.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, TranscodeError> {
    // The encoder rejects quality 0.
    let rgb = flatten_alpha(img);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.value().clamp(1, 100) as u8)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| TranscodeError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, TranscodeError> {
    let mut buf = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut buf))
        .map_err(|e| TranscodeError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, TranscodeError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());

    let mut config = webp::WebPConfig::new()
        .map_err(|_| TranscodeError::Encode("failed to create WebPConfig".to_string()))?;
    config.quality = quality.value() as f32;
    config.method = 4;

    let mem = encoder
        .encode_advanced(&config)
        .map_err(|e| TranscodeError::Encode(format!("WebP encode failed: {e:?}")))?;
    Ok(mem.to_vec())
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, TranscodeError> {
        let mut decoder = decoder(source)?;
        let orientation = orientation_of(&mut decoder);
        let (width, height) = decoder.dimensions();
        if swaps_axes(orientation) {
            Ok(Dimensions {
                width: height,
                height: width,
            })
        } else {
            Ok(Dimensions { width, height })
        }
    }

    fn resize(&self, params: &EncodeParams<'_>) -> Result<Vec<u8>, TranscodeError> {
        let img = load_image(params.source)?;
        let resized = if (img.width(), img.height()) == (params.width, params.height) {
            img
        } else {
            debug!(
                "resampling {}x{} -> {}x{}",
                img.width(),
                img.height(),
                params.width,
                params.height
            );
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        encode_image(&resized, params.format, params.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        jpeg_bytes, jpeg_with_orientation, png_bytes, rgba_png_bytes, transparent_png_bytes,
    };

    fn resize_to(source: &[u8], w: u32, h: u32, format: OutputFormat) -> Vec<u8> {
        RustBackend::new()
            .resize(&EncodeParams {
                source,
                width: w,
                height: h,
                format,
                quality: Quality::new(80),
            })
            .unwrap()
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let dims = RustBackend::new().identify(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_garbage_is_decode_error() {
        let result = RustBackend::new().identify(b"definitely not an image");
        assert!(matches!(result, Err(TranscodeError::Decode(_))));
    }

    #[test]
    fn resize_jpeg_to_webp() {
        let out = resize_to(&jpeg_bytes(400, 300), 200, 150, OutputFormat::WebP);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
        assert_eq!(
            image::guess_format(&out).unwrap(),
            image::ImageFormat::WebP
        );
    }

    #[test]
    fn resize_png_to_jpeg() {
        let out = resize_to(&png_bytes(120, 80), 60, 40, OutputFormat::Jpeg);
        assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (60, 40));
    }

    #[test]
    fn rgba_png_to_jpeg_drops_alpha() {
        let out = resize_to(&rgba_png_bytes(32, 32), 32, 32, OutputFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn jpeg_output_composites_transparency_onto_black() {
        let out = resize_to(&transparent_png_bytes(16, 16), 16, 16, OutputFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        for pixel in decoded.pixels() {
            assert!(pixel.0.iter().all(|&c| c < 16), "expected near-black, got {:?}", pixel);
        }
    }

    #[test]
    fn identify_applies_exif_rotation() {
        let dims = RustBackend::new()
            .identify(&jpeg_with_orientation(400, 200, 6))
            .unwrap();
        assert_eq!((dims.width, dims.height), (200, 400));
    }

    #[test]
    fn identify_ignores_non_rotating_orientation() {
        let dims = RustBackend::new()
            .identify(&jpeg_with_orientation(400, 200, 3))
            .unwrap();
        assert_eq!((dims.width, dims.height), (400, 200));
    }

    #[test]
    fn resize_outputs_upright_pixels() {
        let source = jpeg_with_orientation(400, 200, 6);
        let out = resize_to(&source, 100, 200, OutputFormat::Png);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 200));

        // Unresized, the rotated grid is kept as is instead of being squashed.
        let out = resize_to(&source, 200, 400, OutputFormat::Png);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 400));
    }

    #[test]
    fn png_output_keeps_dimensions_when_unconstrained() {
        let out = resize_to(&jpeg_bytes(64, 48), 64, 48, OutputFormat::Png);
        assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::Png);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn jpeg_quality_zero_still_encodes() {
        let out = RustBackend::new()
            .resize(&EncodeParams {
                source: &jpeg_bytes(40, 40),
                width: 40,
                height: 40,
                format: OutputFormat::Jpeg,
                quality: Quality::new(0),
            })
            .unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn lower_quality_webp_is_not_larger() {
        let source = jpeg_bytes(256, 256);
        let encode = |q| {
            RustBackend::new()
                .resize(&EncodeParams {
                    source: &source,
                    width: 256,
                    height: 256,
                    format: OutputFormat::WebP,
                    quality: Quality::new(q),
                })
                .unwrap()
                .len()
        };
        assert!(encode(10) <= encode(95));
    }

    #[test]
    fn resize_truncated_payload_is_decode_error() {
        let mut source = jpeg_bytes(100, 100);
        source.truncate(20);
        let result = RustBackend::new().resize(&EncodeParams {
            source: &source,
            width: 50,
            height: 50,
            format: OutputFormat::WebP,
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(TranscodeError::Decode(_))));
    }
}
