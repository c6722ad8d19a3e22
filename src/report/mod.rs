//! Results sinks for scored predictions
//!
//! The observer hands every flushed prediction buffer to a [`ResultsSink`].
//! Backends:
//! - [`JsonlReportWriter`] - one [`ReportBatch`] per line
//! - [`SqliteReportWriter`] - one row per scored event in a `reports` table
//! - [`MemorySink`] - keeps batches in memory

pub mod backend;
pub mod jsonl_writer;
pub mod sqlite_writer;

pub use backend::{ResultsSink, SinkError};
pub use jsonl_writer::JsonlReportWriter;
pub use sqlite_writer::SqliteReportWriter;

use crate::config::BackendType;
use crate::event::Label;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One flushed prediction buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBatch {
    /// Position of this batch in the run, starting at 0
    pub report_index: u64,
    /// Wall-clock time of the report (Unix millis)
    pub reported_at: i64,
    pub y_pred: Vec<Label>,
    pub y_true: Vec<Option<Label>>,
}

impl ReportBatch {
    pub fn new(report_index: u64, y_pred: &[Label], y_true: &[Option<Label>]) -> Self {
        Self {
            report_index,
            reported_at: chrono::Utc::now().timestamp_millis(),
            y_pred: y_pred.to_vec(),
            y_true: y_true.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.y_pred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y_pred.is_empty()
    }
}

/// Sink that keeps every batch in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<ReportBatch>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[ReportBatch] {
        &self.batches
    }

    /// Total number of reported predictions
    pub fn reported(&self) -> usize {
        self.batches.iter().map(ReportBatch::len).sum()
    }
}

impl ResultsSink for MemorySink {
    fn report(&mut self, y_pred: &[Label], y_true: &[Option<Label>]) -> Result<(), SinkError> {
        let index = self.batches.len() as u64;
        self.batches.push(ReportBatch::new(index, y_pred, y_true));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

impl<S: ResultsSink + ?Sized> ResultsSink for Box<S> {
    fn report(&mut self, y_pred: &[Label], y_true: &[Option<Label>]) -> Result<(), SinkError> {
        (**self).report(y_pred, y_true)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}

/// Open the sink for `backend` at `path`
pub fn open_sink(backend: BackendType, path: &Path) -> Result<Box<dyn ResultsSink>, SinkError> {
    let sink: Box<dyn ResultsSink> = match backend {
        BackendType::Jsonl => Box::new(JsonlReportWriter::new(path)?),
        BackendType::Sqlite => Box::new(SqliteReportWriter::new(path)?),
    };
    log::info!("📝 Reporting to {} backend: {}", sink.backend_type(), path.display());
    Ok(sink)
}
