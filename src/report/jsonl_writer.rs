//! JSONL writer for reported prediction batches

use super::backend::{ResultsSink, SinkError};
use super::ReportBatch;
use crate::event::Label;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub struct JsonlReportWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    next_index: u64,
    last_flush: Instant,
}

impl JsonlReportWriter {
    /// Open `path` for appending, creating parent directories as needed
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Continue numbering when appending to an existing file
        let next_index = match File::open(&path) {
            Ok(existing) => count_reports(existing)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        log::info!(
            "📝 Writing reports to: {} (next report index {})",
            path.display(),
            next_index
        );
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            next_index,
            last_flush: Instant::now(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One report per non-blank line
fn count_reports(file: File) -> Result<u64, SinkError> {
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

impl ResultsSink for JsonlReportWriter {
    fn report(&mut self, y_pred: &[Label], y_true: &[Option<Label>]) -> Result<(), SinkError> {
        let batch = ReportBatch::new(self.next_index, y_pred, y_true);
        let json = serde_json::to_string(&batch)?;
        writeln!(self.writer, "{}", json)?;
        self.next_index += 1;

        // Flush every 5 seconds
        if self.last_flush.elapsed() > Duration::from_secs(5) {
            self.flush()?;
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        self.last_flush = Instant::now();
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}

impl Drop for JsonlReportWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
