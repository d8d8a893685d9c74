//! Pure calculation functions for image dimensions and size metrics.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit an image inside optional maximum width/height bounds.
///
/// The width bound is applied first: if the width exceeds it, both edges are
/// scaled by `max_width / width`. The height bound is then applied to the
/// already width-fitted size the same way. Each step only shrinks, so the
/// result satisfies both bounds. Edges are rounded to the nearest pixel and
/// never drop below 1.
///
/// # Arguments
/// * `original` - Original image dimensions (width, height)
/// * `max_width` - Optional upper bound on the output width
/// * `max_height` - Optional upper bound on the output height
///
/// # Examples
/// ```
/// # use pixpress::imaging::compute_target_dimensions;
/// assert_eq!(compute_target_dimensions((4000, 2000), Some(1000), None), (1000, 500));
/// assert_eq!(compute_target_dimensions((4000, 2000), Some(1000), Some(400)), (800, 400));
/// assert_eq!(compute_target_dimensions((640, 480), None, None), (640, 480));
/// ```
pub fn compute_target_dimensions(
    original: (u32, u32),
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> (u32, u32) {
    let mut width = original.0 as f64;
    let mut height = original.1 as f64;

    if let Some(max_w) = max_width.map(f64::from).filter(|&m| width > m) {
        height *= max_w / width;
        width = max_w;
    }

    if let Some(max_h) = max_height.map(f64::from).filter(|&m| height > m) {
        width *= max_h / height;
        height = max_h;
    }

    (round_edge(width), round_edge(height))
}

fn round_edge(value: f64) -> u32 {
    (value.round() as u32).max(1)
}

/// Percentage saved by recompression: `(1 - output / original) * 100`.
///
/// Negative when the output grew. Returns `0.0` for an empty original.
pub fn savings_percent(original_size: u64, output_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (1.0 - output_size as f64 / original_size as f64) * 100.0
}
