//! # pixpress
//!
//! Batch image resizer and recompressor. Give it a pile of JPEG, PNG and WebP
//! files and it produces smaller copies in one output format, scaled down to
//! fit optional maximum dimensions, and tells you how many bytes each one
//! saved.
//!
//! # Architecture: Collect, Process, Export
//!
//! ```text
//! 1. Collect   paths     →  Registry   (files become pending records)
//! 2. Process   pending   →  results    (decode → resize → encode, per image)
//! 3. Export    processed →  out/       (one file per processed record)
//! ```
//!
//! The registry is the single source of truth. A batch run works on a
//! snapshot of the pending records and a copy of the settings, and its
//! outcomes are written back afterwards, so a record removed while a run is
//! in flight simply has its result dropped.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`intake`] | `RawFile` sources, content-type filter, directory expansion |
//! | [`registry`] | Insertion-ordered image records with pending/processed/failed status |
//! | [`imaging`] | Dimension math, format mapping, the `ImageBackend` trait and `transcode` |
//! | [`batch`] | `BatchRun` state machine, progress events, JSON report |
//! | [`export`] | `BlobSink` trait, `DirectorySink`, staggered bulk export |
//! | [`config`] | `pixpress.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting, pure `format_*` functions |
//!
//! # Design Decisions
//!
//! ## Failures Stay With Their Image
//!
//! A file that cannot be decoded or encoded never stops the batch. Its error
//! is stored on the record, which stays pending so the next run retries it.
//!
//! ## Sequential by Default
//!
//! Decoded images are large. Processing one at a time keeps exactly one
//! pixel buffer alive. A rayon pool is used only when `max_workers` asks for
//! more, and then progress events may arrive out of order.
//!
//! ## Self-Contained Imaging
//!
//! Decoding, Lanczos3 resampling, JPEG and PNG encoding come from the `image`
//! crate. Lossy WebP goes through `webp`, which builds libwebp from source,
//! since `image` only encodes lossless WebP. No ImageMagick or other system
//! tool is needed at runtime.

pub mod batch;
pub mod config;
pub mod export;
pub mod imaging;
pub mod intake;
pub mod output;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_helpers;
