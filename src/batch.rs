//! Batch processing of pending images.
//!
//! A [`BatchRun`] takes a settings snapshot when it is created and walks an
//! ordered list of records through [`transcode`], one at a time by default.
//! Each run moves through three states:
//!
//! ```text
//! NotStarted ──execute()──▶ Running ──last item──▶ Completed
//! ```
//!
//! A failing image never aborts the run: its error is captured against its
//! id and the next image is processed. The run always reaches `Completed`.
//!
//! ## Progress events
//!
//! Callers that want per-image progress pass an `mpsc::Sender<BatchEvent>`.
//! The run sends `Started`, then one `ItemFinished` per image (success or
//! failure), then `Completed`. With more than one worker, `ItemFinished`
//! events may arrive out of submission order; the returned [`BatchReport`]
//! is always in submission order.
//!
//! ## Applying results
//!
//! The run never touches the registry. [`apply_report`] writes outcomes back,
//! and silently drops outcomes for records removed in the meantime.
//! [`process_pending`] does snapshot → run → apply in one call.

use crate::config::{ProcessingConfig, Settings, effective_workers};
use crate::imaging::{ImageBackend, ProcessedResult, TranscodeError, transcode};
use crate::registry::{ImageId, ImageRecord, Registry};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("batch run already started")]
    AlreadyStarted,
    #[error("failed to start worker pool: {0}")]
    Pool(String),
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
}

/// Display-ready summary of one finished image.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSummary {
    Processed {
        output_name: String,
        original_size: u64,
        size: u64,
        width: u32,
        height: u32,
    },
    Failed(TranscodeError),
}

impl ItemSummary {
    fn from_outcome(outcome: &Result<ProcessedResult, TranscodeError>) -> Self {
        match outcome {
            Ok(result) => ItemSummary::Processed {
                output_name: result.name.clone(),
                original_size: result.original_size,
                size: result.size,
                width: result.width,
                height: result.height,
            },
            Err(e) => ItemSummary::Failed(e.clone()),
        }
    }
}

/// Progress signal emitted while a run executes.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    ItemFinished {
        /// Zero-based position in the run.
        index: usize,
        total: usize,
        id: ImageId,
        name: String,
        summary: ItemSummary,
    },
    Completed {
        succeeded: usize,
        failed: usize,
    },
}

/// Outcome for one record of a run.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    pub index: usize,
    pub id: ImageId,
    /// Input display name.
    pub name: String,
    pub outcome: Result<ProcessedResult, TranscodeError>,
}

/// Everything a completed run produced, in submission order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub settings: Settings,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn error_for(&self, id: &ImageId) -> Option<&TranscodeError> {
        self.items
            .iter()
            .find(|i| &i.id == id)
            .and_then(|i| i.outcome.as_ref().err())
    }

    /// Serializable view of the report (written by `--report`).
    pub fn to_document(&self) -> ReportDocument {
        ReportDocument {
            settings: self.settings,
            succeeded: self.succeeded(),
            failed: self.failed(),
            items: self.items.iter().map(ReportEntry::from_outcome).collect(),
        }
    }
}

/// JSON shape of a batch report.
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub settings: Settings,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ReportEntry>,
}

#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub id: ImageId,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportEntry {
    fn from_outcome(item: &ItemOutcome) -> Self {
        let mut entry = ReportEntry {
            id: item.id.clone(),
            input: item.name.clone(),
            output: None,
            original_size: None,
            size: None,
            width: None,
            height: None,
            savings_percent: None,
            error: None,
        };
        match &item.outcome {
            Ok(r) => {
                entry.output = Some(r.name.clone());
                entry.original_size = Some(r.original_size);
                entry.size = Some(r.size);
                entry.width = Some(r.width);
                entry.height = Some(r.height);
                entry.savings_percent = Some((r.savings_percent() * 10.0).round() / 10.0);
            }
            Err(e) => entry.error = Some(e.to_string()),
        }
        entry
    }
}

/// One batch run over a fixed list of records.
pub struct BatchRun<'a, B: ImageBackend> {
    backend: &'a B,
    settings: Settings,
    workers: usize,
    state: RunState,
}

impl<'a, B: ImageBackend> BatchRun<'a, B> {
    /// Create a run. `settings` is copied here and used for every image.
    pub fn new(backend: &'a B, settings: Settings) -> Self {
        Self {
            backend,
            settings,
            workers: 1,
            state: RunState::NotStarted,
        }
    }

    /// Allow up to `workers` concurrent transcodes (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Process `records` in order. Can be called once per run.
    pub fn execute(
        &mut self,
        records: &[ImageRecord],
        events: Option<&Sender<BatchEvent>>,
    ) -> Result<BatchReport, BatchError> {
        if self.state != RunState::NotStarted {
            return Err(BatchError::AlreadyStarted);
        }

        let pool = if self.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .map_err(|e| BatchError::Pool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        let total = records.len();
        self.state = RunState::Running;
        info!(
            "processing {} image(s) as {} (quality {}, workers {})",
            total,
            self.settings.format,
            self.settings.quality.value(),
            self.workers
        );
        emit(events, BatchEvent::Started { total });

        let items: Vec<ItemOutcome> = match pool {
            Some(pool) => pool.install(|| {
                records
                    .par_iter()
                    .enumerate()
                    .map(|(index, record)| self.process_one(index, total, record, events))
                    .collect()
            }),
            None => records
                .iter()
                .enumerate()
                .map(|(index, record)| self.process_one(index, total, record, events))
                .collect(),
        };

        let report = BatchReport {
            settings: self.settings,
            items,
        };
        self.state = RunState::Completed;

        let (succeeded, failed) = (report.succeeded(), report.failed());
        if failed > 0 {
            warn!("batch completed with {failed} failed image(s) out of {total}");
        } else {
            info!("batch completed: {succeeded} image(s) processed");
        }
        emit(events, BatchEvent::Completed { succeeded, failed });

        Ok(report)
    }

    fn process_one(
        &self,
        index: usize,
        total: usize,
        record: &ImageRecord,
        events: Option<&Sender<BatchEvent>>,
    ) -> ItemOutcome {
        debug!("transcoding {} ({})", record.name, record.id);
        let outcome = transcode(self.backend, record, &self.settings);
        if let Err(e) = &outcome {
            warn!("{} ({}): {}", record.name, record.id, e);
        }

        emit(
            events,
            BatchEvent::ItemFinished {
                index,
                total,
                id: record.id.clone(),
                name: record.name.clone(),
                summary: ItemSummary::from_outcome(&outcome),
            },
        );

        ItemOutcome {
            index,
            id: record.id.clone(),
            name: record.name.clone(),
            outcome,
        }
    }
}

fn emit(events: Option<&Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}

/// Run a batch over `records` sequentially with a settings snapshot.
pub fn run_batch(
    backend: &impl ImageBackend,
    records: &[ImageRecord],
    settings: &Settings,
    events: Option<&Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    BatchRun::new(backend, *settings).execute(records, events)
}

/// Write a report's outcomes back into the registry.
///
/// Outcomes for records that no longer exist are dropped.
pub fn apply_report(registry: &mut Registry, report: &BatchReport) {
    for item in &report.items {
        match &item.outcome {
            Ok(result) => {
                registry.attach_result(&item.id, result.clone());
            }
            Err(e) => {
                registry.record_failure(&item.id, e.clone());
            }
        }
    }
}

/// Process every pending record of `registry` and store the outcomes.
pub fn process_pending(
    registry: &mut Registry,
    backend: &impl ImageBackend,
    settings: &Settings,
    processing: &ProcessingConfig,
    events: Option<&Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    let snapshot: Vec<ImageRecord> = registry.pending().into_iter().cloned().collect();
    let mut run =
        BatchRun::new(backend, *settings).with_workers(effective_workers(processing));
    let report = run.execute(&snapshot, events)?;
    apply_report(registry, &report);
    Ok(report)
}
