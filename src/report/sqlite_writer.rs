//! SQLite writer for reported predictions
//!
//! Every scored event becomes one row of the `reports` table, tagged with the
//! index of the batch it was reported in.

use super::backend::{ResultsSink, SinkError};
use crate::event::Label;
use rusqlite::{params, Connection};
use std::path::Path;

struct ReportRow {
    report_index: i64,
    position: i64,
    y_pred: f64,
    y_true: Option<f64>,
    reported_at: i64,
}

pub struct SqliteReportWriter {
    conn: Connection,
    batch: Vec<ReportRow>,
    batch_size: usize,
    next_index: i64,
}

impl SqliteReportWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, SinkError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SinkError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create database directory {}: {}", parent.display(), e),
                ))
            })?;
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                report_index INTEGER NOT NULL,
                position INTEGER NOT NULL,
                y_pred REAL NOT NULL,
                y_true REAL,
                reported_at INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_report_index ON reports(report_index, position)",
            [],
        )?;

        // Continue numbering when appending to an existing database
        let next_index: i64 = conn.query_row(
            "SELECT COALESCE(MAX(report_index) + 1, 0) FROM reports",
            [],
            |row| row.get(0),
        )?;

        log::info!("✅ SQLite report database initialized with WAL mode");

        Ok(Self {
            conn,
            batch: Vec::with_capacity(100),
            batch_size: 100,
            next_index,
        })
    }

    fn flush_batch(&mut self) -> Result<(), SinkError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for row in &self.batch {
            tx.execute(
                "INSERT INTO reports (report_index, position, y_pred, y_true, reported_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.report_index,
                    row.position,
                    row.y_pred,
                    row.y_true,
                    row.reported_at,
                ],
            )?;
        }
        tx.commit()?;

        log::debug!("✅ Flushed {} report rows to SQLite", self.batch.len());
        self.batch.clear();
        Ok(())
    }
}

impl ResultsSink for SqliteReportWriter {
    fn report(&mut self, y_pred: &[Label], y_true: &[Option<Label>]) -> Result<(), SinkError> {
        let reported_at = chrono::Utc::now().timestamp_millis();
        for (position, (pred, truth)) in y_pred.iter().zip(y_true).enumerate() {
            self.batch.push(ReportRow {
                report_index: self.next_index,
                position: position as i64,
                y_pred: *pred,
                y_true: *truth,
                reported_at,
            });
        }
        self.next_index += 1;

        if self.batch.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.flush_batch()
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}

impl Drop for SqliteReportWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush_batch() {
            log::error!("Failed to flush reports on drop: {}", e);
        }
    }
}
