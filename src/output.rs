//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! Output: webp at quality 85, fit within 1920×any
//! Processing 3 images
//! 001 beach.jpg → beach.webp
//!     Before: 2.4 MB  After: 310.5 KB  Size: 1920×1280  (-87.4%)
//! 002 broken.jpg
//!     Failed: decode failed: invalid JPEG marker
//! 003 logo.png → logo.webp
//!     Before: 12 KB  After: 13.1 KB  Size: 64×64
//! Done: 2 processed, 1 failed
//! Exported 2 files to out/
//! ```
//!
//! ## Check
//!
//! ```text
//! Inputs
//! 001 beach.jpg
//!     Size: 2.4 MB  Type: JPEG  Dimensions: 4000×2667
//! 002 broken.jpg
//!     Size: 10 Bytes  Type: JPEG  Dimensions: unreadable (decode failed: ...)
//!
//! Skipped
//!     notes.txt: notes.txt: unsupported content type 'application/octet-stream'
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, ItemSummary};
use crate::config::Settings;
use crate::export::ExportSummary;
use crate::imaging::TranscodeError;
use crate::intake::IntakeError;
use crate::registry::{ImageRecord, ImageStatus, Registry};
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable size with 1024-based units, at most two decimals.
///
/// ```text
/// 0     → 0 Bytes
/// 1536  → 1.5 KB
/// 1024  → 1 KB
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Savings badge such as `-87.4%`, or `None` when the output is not smaller.
pub fn format_savings(original_size: u64, size: u64) -> Option<String> {
    let percent = crate::imaging::savings_percent(original_size, size);
    let rounded = (percent * 10.0).round() / 10.0;
    (rounded > 0.0).then(|| format!("-{:.1}%", rounded))
}

/// `image/jpeg` → `JPEG`.
pub fn content_type_label(content_type: &str) -> String {
    content_type
        .split('/')
        .nth(1)
        .unwrap_or(content_type)
        .to_ascii_uppercase()
}

/// Format a 0-based index as a 1-based, 3-digit zero-padded position.
fn format_index(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

fn comparison_line(original_size: u64, size: u64, width: u32, height: u32) -> String {
    let mut line = format!(
        "    Before: {}  After: {}  Size: {}\u{00d7}{}",
        format_file_size(original_size),
        format_file_size(size),
        width,
        height
    );
    if let Some(badge) = format_savings(original_size, size) {
        line.push_str(&format!("  ({})", badge));
    }
    line
}

// ============================================================================
// Batch progress
// ============================================================================

/// One-line description of the encoding a run will use. Quality is only
/// shown for lossy formats.
pub fn format_settings(settings: &Settings) -> String {
    let mut line = if settings.format.is_lossy() {
        format!(
            "Output: {} at quality {}",
            settings.format,
            settings.quality.value()
        )
    } else {
        format!("Output: {} (lossless)", settings.format)
    };
    if settings.max_width.is_some() || settings.max_height.is_some() {
        let bound = |b: Option<u32>| b.map_or_else(|| "any".to_string(), |v| v.to_string());
        line.push_str(&format!(
            ", fit within {}\u{00d7}{}",
            bound(settings.max_width),
            bound(settings.max_height)
        ));
    }
    line
}

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Processing {} {}", total, noun)]
        }
        BatchEvent::ItemFinished {
            index,
            name,
            summary,
            ..
        } => match summary {
            ItemSummary::Processed {
                output_name,
                original_size,
                size,
                width,
                height,
            } => vec![
                format!("{} {} \u{2192} {}", format_index(*index), name, output_name),
                comparison_line(*original_size, *size, *width, *height),
            ],
            ItemSummary::Failed(err) => vec![
                format!("{} {}", format_index(*index), name),
                format!("    Failed: {}", err),
            ],
        },
        BatchEvent::Completed { succeeded, failed } => {
            vec![format!("Done: {} processed, {} failed", succeeded, failed)]
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Format one registry record the way its status dictates.
///
/// ```text
/// 001 beach.webp [optimized]
///     Before: 2.4 MB  After: 310.5 KB  Size: 1920×1280  (-87.4%)
/// 002 broken.jpg [pending]
///     Size: 10 Bytes  Type: JPEG
///     Last error: decode failed: ...
/// ```
pub fn format_record(index: usize, record: &ImageRecord) -> Vec<String> {
    match &record.status {
        ImageStatus::Processed(result) => vec![
            format!("{} {} [optimized]", format_index(index), result.name),
            comparison_line(result.original_size, result.size, result.width, result.height),
        ],
        status => {
            let mut lines = vec![
                format!("{} {} [pending]", format_index(index), record.name),
                format!(
                    "    Size: {}  Type: {}",
                    format_file_size(record.size),
                    content_type_label(&record.content_type)
                ),
            ];
            if let ImageStatus::Failed(err) = status {
                lines.push(format!("    Last error: {}", err));
            }
            lines
        }
    }
}

/// Format the records that are still not processed, numbered by their
/// position in the registry. Empty when everything was processed.
pub fn format_pending(registry: &Registry) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, record) in registry.all().iter().enumerate() {
        if record.is_pending() {
            lines.extend(format_record(i, record));
        }
    }
    if !lines.is_empty() {
        lines.insert(0, "Still pending".to_string());
    }
    lines
}

pub fn print_pending(registry: &Registry) {
    for line in format_pending(registry) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the `check` listing: accepted inputs with their dimensions,
/// then anything that was skipped.
pub fn format_check_output(
    entries: &[(&ImageRecord, Result<(u32, u32), TranscodeError>)],
    skipped: &[(PathBuf, IntakeError)],
) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Inputs".to_string());
    if entries.is_empty() {
        lines.push("    (none)".to_string());
    }
    for (i, (record, dims)) in entries.iter().enumerate() {
        let dims = match dims {
            Ok((w, h)) => format!("{}\u{00d7}{}", w, h),
            Err(e) => format!("unreadable ({})", e),
        };
        lines.push(format!("{} {}", format_index(i), record.name));
        lines.push(format!(
            "    Size: {}  Type: {}  Dimensions: {}",
            format_file_size(record.size),
            content_type_label(&record.content_type),
            dims
        ));
    }

    if !skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for (path, err) in skipped {
            lines.push(format!("    {}: {}", path.display(), err));
        }
    }

    lines
}

pub fn print_check_output(
    entries: &[(&ImageRecord, Result<(u32, u32), TranscodeError>)],
    skipped: &[(PathBuf, IntakeError)],
) {
    for line in format_check_output(entries, skipped) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

/// ```text
/// Exported 2 files to out
/// Failed to export 1 file
///     img-0003: IO error: No space left on device
/// ```
pub fn format_export_summary(dir: &Path, summary: &ExportSummary) -> Vec<String> {
    let file_noun = |n: usize| if n == 1 { "file" } else { "files" };
    let mut lines = vec![format!(
        "Exported {} {} to {}",
        summary.stored.len(),
        file_noun(summary.stored.len()),
        dir.display()
    )];
    if !summary.failed.is_empty() {
        lines.push(format!(
            "Failed to export {} {}",
            summary.failed.len(),
            file_noun(summary.failed.len())
        ));
        for (id, err) in &summary.failed {
            lines.push(format!("    {}: {}", id, err));
        }
    }
    lines
}

pub fn print_export_summary(dir: &Path, summary: &ExportSummary) {
    for line in format_export_summary(dir, summary) {
        println!("{}", line);
    }
}
