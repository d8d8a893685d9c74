//! End-to-end test of collect → process → export with the real backend.
//!
//! Images are generated on the fly into a temp directory, so the test needs
//! no fixtures and no external tools.

use image::{ImageFormat, Rgb, RgbImage};
use pixpress::batch::{self, BatchEvent};
use pixpress::config::{ProcessingConfig, Settings};
use pixpress::export::{self, DirectorySink};
use pixpress::imaging::{OutputFormat, Quality, RustBackend, TranscodeError};
use pixpress::intake::{self, RawFile};
use pixpress::registry::Registry;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save_with_format(path, format).unwrap();
}

fn decoded_dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

/// Input dir with two good images, one corrupt JPEG and one text file.
fn setup_inputs() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_image(&tmp.path().join("a-landscape.jpg"), 400, 200, ImageFormat::Jpeg);
    std::fs::write(tmp.path().join("b-broken.jpg"), b"definitely not a jpeg").unwrap();
    write_image(&tmp.path().join("c-portrait.png"), 100, 300, ImageFormat::Png);
    std::fs::write(tmp.path().join("notes.txt"), b"hello").unwrap();
    tmp
}

fn load(dir: &Path) -> Registry {
    let scan = intake::collect_inputs(&[dir.to_path_buf()], false);
    assert_eq!(scan.skipped.len(), 1, "notes.txt should be skipped");
    let mut registry = Registry::new();
    let summary = registry.add_all(scan.accepted.iter().map(|f| f as &dyn RawFile));
    assert!(summary.failed.is_empty());
    registry
}

#[test]
fn process_and_export_webp() {
    let inputs = setup_inputs();
    let out = TempDir::new().unwrap();
    let mut registry = load(inputs.path());
    assert_eq!(registry.len(), 3);

    let settings = Settings {
        format: OutputFormat::WebP,
        quality: Quality::new(80),
        max_width: Some(200),
        max_height: Some(200),
    };
    let (tx, rx) = mpsc::channel();
    let report = batch::process_pending(
        &mut registry,
        &RustBackend::new(),
        &settings,
        &ProcessingConfig::default(),
        Some(&tx),
    )
    .unwrap();
    drop(tx);

    assert_eq!((report.succeeded(), report.failed()), (2, 1));
    assert!(matches!(
        report.items[1].outcome,
        Err(TranscodeError::Decode(_))
    ));

    let events: Vec<BatchEvent> = rx.iter().collect();
    assert_eq!(events.first(), Some(&BatchEvent::Started { total: 3 }));
    assert_eq!(
        events.last(),
        Some(&BatchEvent::Completed {
            succeeded: 2,
            failed: 1
        })
    );

    let counts = registry.counts();
    assert_eq!(counts.processed, 2);
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.failed, 1);

    let mut sink = DirectorySink::new(out.path().join("webp"));
    let exported = export::export_all(&registry, &mut sink, Duration::ZERO);
    assert_eq!(exported.stored, vec!["a-landscape.webp", "c-portrait.webp"]);
    assert!(exported.failed.is_empty());

    let landscape = out.path().join("webp/a-landscape.webp");
    let portrait = out.path().join("webp/c-portrait.webp");
    assert_eq!(decoded_dimensions(&landscape), (200, 100));
    assert_eq!(decoded_dimensions(&portrait), (67, 200));
    assert_eq!(
        image::ImageFormat::from_path(&landscape).unwrap(),
        ImageFormat::WebP
    );
}

#[test]
fn unconstrained_png_keeps_dimensions() {
    let inputs = setup_inputs();
    let out = TempDir::new().unwrap();
    let mut registry = load(inputs.path());

    let settings = Settings {
        format: OutputFormat::Png,
        ..Settings::default()
    };
    batch::process_pending(
        &mut registry,
        &RustBackend::new(),
        &settings,
        &ProcessingConfig::default(),
        None,
    )
    .unwrap();

    let mut sink = DirectorySink::new(out.path());
    let exported = export::export_all(&registry, &mut sink, Duration::ZERO);
    assert!(exported.failed.is_empty());

    assert_eq!(
        decoded_dimensions(&out.path().join("a-landscape.png")),
        (400, 200)
    );
    assert_eq!(
        decoded_dimensions(&out.path().join("c-portrait.png")),
        (100, 300)
    );
}

#[test]
fn parallel_jpeg_run_matches_sequential() {
    let inputs = setup_inputs();
    let settings = Settings {
        format: OutputFormat::Jpeg,
        quality: Quality::new(60),
        max_width: Some(150),
        max_height: None,
    };

    let mut sequential = load(inputs.path());
    let seq = batch::process_pending(
        &mut sequential,
        &RustBackend::new(),
        &settings,
        &ProcessingConfig::default(),
        None,
    )
    .unwrap();

    let mut parallel = load(inputs.path());
    let par = batch::process_pending(
        &mut parallel,
        &RustBackend::new(),
        &settings,
        &ProcessingConfig {
            max_workers: Some(2),
            ..ProcessingConfig::default()
        },
        None,
    )
    .unwrap();

    let dims = |report: &batch::BatchReport| -> Vec<Option<(u32, u32)>> {
        report
            .items
            .iter()
            .map(|i| i.outcome.as_ref().ok().map(|r| (r.width, r.height)))
            .collect()
    };
    assert_eq!(dims(&seq), dims(&par));
    assert_eq!(dims(&seq), vec![Some((150, 75)), None, Some((100, 300))]);
}

#[test]
fn failed_image_is_retried_on_next_run() {
    let inputs = setup_inputs();
    let mut registry = load(inputs.path());
    let backend = RustBackend::new();
    let processing = ProcessingConfig::default();

    batch::process_pending(
        &mut registry,
        &backend,
        &Settings::default(),
        &processing,
        None,
    )
    .unwrap();
    let second = batch::process_pending(
        &mut registry,
        &backend,
        &Settings::default(),
        &processing,
        None,
    )
    .unwrap();

    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].name, "b-broken.jpg");
    assert!(second.items[0].outcome.is_err());
}
