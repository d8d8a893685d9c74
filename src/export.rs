//! Export of processed images.
//!
//! A [`BlobSink`] receives encoded payloads one at a time. [`DirectorySink`]
//! writes them as files; tests and embedders can supply their own sink.
//! Bulk export emits in registry order and can pause between files. A file
//! that cannot be written is recorded and the rest are still emitted.

use crate::imaging::split_extension;
use crate::registry::{ImageId, ImageRecord, Registry};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("image {0} has not been processed")]
    NotProcessed(ImageId),
    #[error("'{0}' has no usable file name")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for exported payloads.
pub trait BlobSink {
    /// Deliver one payload. Returns the name it was stored under.
    fn emit(&mut self, name: &str, mime_type: &str, bytes: &[u8]) -> Result<String, ExportError>;
}

/// Writes payloads as files into one directory.
///
/// The directory is created on first use. Only the final component of a
/// name is used, so every file lands directly inside the directory. Names
/// already emitted through this sink get a `-1`, `-2`, … suffix before the
/// extension.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    used: HashSet<String>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            used: HashSet::new(),
        }
    }

    fn unique_name(&mut self, name: &str) -> String {
        if self.used.insert(name.to_string()) {
            return name.to_string();
        }
        let (stem, ext) = split_extension(name);
        let mut n = 1;
        loop {
            let candidate = match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl BlobSink for DirectorySink {
    fn emit(&mut self, name: &str, mime_type: &str, bytes: &[u8]) -> Result<String, ExportError> {
        let base = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ExportError::InvalidName(name.to_string()))?;
        fs::create_dir_all(&self.dir)?;
        let stored = self.unique_name(base);
        let path = self.dir.join(&stored);
        fs::write(&path, bytes)?;
        debug!("wrote {} ({}, {} bytes)", path.display(), mime_type, bytes.len());
        Ok(stored)
    }
}

/// Emit one processed record.
pub fn export_one(record: &ImageRecord, sink: &mut dyn BlobSink) -> Result<String, ExportError> {
    let result = record
        .processed()
        .ok_or_else(|| ExportError::NotProcessed(record.id.clone()))?;
    sink.emit(&result.name, result.mime_type(), &result.data)
}

/// Outcome of a bulk export.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Stored names in emission order.
    pub stored: Vec<String>,
    pub failed: Vec<(ImageId, ExportError)>,
}

/// Emit every processed record in registry order, pausing `stagger`
/// between files. Unprocessed records are skipped.
///
/// Each emission stands alone: a sink error is recorded against the
/// record's id and the remaining records are still emitted.
pub fn export_all(
    registry: &Registry,
    sink: &mut dyn BlobSink,
    stagger: Duration,
) -> ExportSummary {
    let mut summary = ExportSummary::default();

    for (i, record) in registry.processed().into_iter().enumerate() {
        if i > 0 && !stagger.is_zero() {
            thread::sleep(stagger);
        }
        match export_one(record, sink) {
            Ok(name) => summary.stored.push(name),
            Err(err) => {
                warn!("could not export {}: {}", record.name, err);
                summary.failed.push((record.id.clone(), err));
            }
        }
    }

    info!(
        "exported {} image(s), {} failed",
        summary.stored.len(),
        summary.failed.len()
    );
    summary
}
