//! Shared test utilities for the pixpress test suite.
//!
//! Synthetic image fixtures are generated in memory with the `image` crate,
//! so no binary fixtures need to live in the repository.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = jpeg_bytes(200, 100);
//! let record = record_with("img-0001", "photo.jpg", bytes);
//! assert_eq!(record.size, record.data.len() as u64);
//! ```

use crate::registry::{ImageId, ImageRecord, ImageStatus};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Synthetic images
// =========================================================================

/// A horizontal gradient, so encoders have something non-trivial to chew on.
fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgb([r, g, 128])
    })
}

fn encode(img: image::DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Encoded JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient_rgb(width, height).into(), ImageFormat::Jpeg)
}

/// Encoded opaque PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient_rgb(width, height).into(), ImageFormat::Png)
}

/// Encoded PNG with a half-transparent alpha channel.
pub fn rgba_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| Rgba([200, (x % 256) as u8, 40, 128]));
    encode(img.into(), ImageFormat::Png)
}

/// Encoded PNG whose pixels are red but fully transparent.
pub fn transparent_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 0]));
    encode(img.into(), ImageFormat::Png)
}

/// Encoded JPEG carrying an EXIF APP1 segment with the given orientation
/// tag (1-8). `width`/`height` describe the stored, unrotated grid.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = jpeg_bytes(width, height);
    let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
    app1.extend_from_slice(b"Exif\0\0");
    // Big-endian TIFF header, first IFD at offset 8.
    app1.extend_from_slice(b"MM\0\x2A");
    app1.extend_from_slice(&8u32.to_be_bytes());
    // One entry: Orientation (0x0112), SHORT, count 1.
    app1.extend_from_slice(&1u16.to_be_bytes());
    app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    app1.extend_from_slice(&orientation.to_be_bytes());
    app1.extend_from_slice(&[0x00, 0x00]);
    // No next IFD.
    app1.extend_from_slice(&0u32.to_be_bytes());

    let mut out = Vec::with_capacity(jpeg.len() + app1.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

// =========================================================================
// Records
// =========================================================================

/// A pending record whose declared size matches its payload.
pub fn record_with(id: &str, name: &str, data: Vec<u8>) -> ImageRecord {
    ImageRecord {
        id: ImageId::from(id),
        name: name.to_string(),
        size: data.len() as u64,
        content_type: "image/jpeg".to_string(),
        data: data.into(),
        status: ImageStatus::Pending,
    }
}
