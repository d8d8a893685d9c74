//! In-memory collection of image records.
//!
//! Records keep insertion order. Each has a status that is exactly one of
//! pending, processed or failed; a failed record still counts as pending for
//! display and for the next run, and its error stays retrievable by id.
//!
//! Identifiers come from a counter owned by the registry and are never
//! reused, not even after [`Registry::clear`].

use crate::imaging::{ProcessedResult, TranscodeError};
use crate::intake::{IntakeError, RawFile};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Unique identifier of a record within its registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where a record is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageStatus {
    Pending,
    Processed(ProcessedResult),
    /// Last transcode attempt failed. Presented as pending.
    Failed(TranscodeError),
}

/// One user-supplied image.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: ImageId,
    pub name: String,
    /// Declared size of the original in bytes.
    pub size: u64,
    pub content_type: String,
    /// Original encoded payload, shared with in-flight batch snapshots.
    pub data: Arc<[u8]>,
    pub status: ImageStatus,
}

impl ImageRecord {
    pub fn is_processed(&self) -> bool {
        matches!(self.status, ImageStatus::Processed(_))
    }

    /// Pending in the presentation sense: not processed (never run, or failed).
    pub fn is_pending(&self) -> bool {
        !self.is_processed()
    }

    pub fn processed(&self) -> Option<&ProcessedResult> {
        match &self.status {
            ImageStatus::Processed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&TranscodeError> {
        match &self.status {
            ImageStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Record counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryCounts {
    pub total: usize,
    /// Not processed, including failed.
    pub pending: usize,
    pub processed: usize,
    pub failed: usize,
}

/// Outcome of [`Registry::add_all`].
#[derive(Debug, Default)]
pub struct AddSummary {
    pub added: Vec<ImageId>,
    pub failed: Vec<(String, IntakeError)>,
}

/// Insertion-ordered image records.
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<ImageRecord>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_id(&mut self) -> ImageId {
        self.next_id += 1;
        ImageId(format!("img-{:04}", self.next_id))
    }

    /// Read a raw file and append a pending record for it.
    ///
    /// A read failure leaves the registry unchanged (no id is consumed).
    pub fn add(&mut self, file: &dyn RawFile) -> Result<&ImageRecord, IntakeError> {
        let bytes = file.read_bytes().map_err(|source| IntakeError::Read {
            name: file.name().to_string(),
            source,
        })?;
        let id = self.generate_id();
        debug!("added {} as {} ({} bytes)", file.name(), id, bytes.len());

        self.records.push(ImageRecord {
            id,
            name: file.name().to_string(),
            size: file.size(),
            content_type: file.content_type().to_string(),
            data: bytes.into(),
            status: ImageStatus::Pending,
        });
        Ok(&self.records[self.records.len() - 1])
    }

    /// Add several files independently; one failure does not stop the rest.
    pub fn add_all<'a, I>(&mut self, files: I) -> AddSummary
    where
        I: IntoIterator<Item = &'a dyn RawFile>,
    {
        let mut summary = AddSummary::default();
        for file in files {
            match self.add(file) {
                Ok(record) => summary.added.push(record.id.clone()),
                Err(e) => summary.failed.push((file.name().to_string(), e)),
            }
        }
        summary
    }

    /// Remove a record. Returns whether anything was removed.
    pub fn remove(&mut self, id: &ImageId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| &r.id != id);
        self.records.len() != before
    }

    /// Drop every record. Ids handed out so far stay retired.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn all(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn get(&self, id: &ImageId) -> Option<&ImageRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    fn get_mut(&mut self, id: &ImageId) -> Option<&mut ImageRecord> {
        self.records.iter_mut().find(|r| &r.id == id)
    }

    /// Records without a processed result, in insertion order.
    pub fn pending(&self) -> Vec<&ImageRecord> {
        self.records.iter().filter(|r| r.is_pending()).collect()
    }

    pub fn processed(&self) -> Vec<&ImageRecord> {
        self.records.iter().filter(|r| r.is_processed()).collect()
    }

    pub fn failed(&self) -> Vec<&ImageRecord> {
        self.records.iter().filter(|r| r.error().is_some()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn counts(&self) -> RegistryCounts {
        let processed = self.records.iter().filter(|r| r.is_processed()).count();
        let failed = self.records.iter().filter(|r| r.error().is_some()).count();
        RegistryCounts {
            total: self.records.len(),
            pending: self.records.len() - processed,
            processed,
            failed,
        }
    }

    /// Set or replace a record's result. No-op if the record is gone.
    pub fn attach_result(&mut self, id: &ImageId, result: ProcessedResult) -> bool {
        match self.get_mut(id) {
            Some(record) => {
                record.status = ImageStatus::Processed(result);
                true
            }
            None => {
                debug!("dropping result for removed record {}", id);
                false
            }
        }
    }

    /// Mark a record as failed. No-op if the record is gone.
    pub fn record_failure(&mut self, id: &ImageId, error: TranscodeError) -> bool {
        match self.get_mut(id) {
            Some(record) => {
                record.status = ImageStatus::Failed(error);
                true
            }
            None => false,
        }
    }

    pub fn error_for(&self, id: &ImageId) -> Option<&TranscodeError> {
        self.get(id).and_then(ImageRecord::error)
    }
}
