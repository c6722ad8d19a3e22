//! Results sink trait for reported prediction batches

use crate::event::Label;

#[derive(Debug)]
pub enum SinkError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Database(String),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Serialization(err)
    }
}

impl From<rusqlite::Error> for SinkError {
    fn from(err: rusqlite::Error) -> Self {
        SinkError::Database(err.to_string())
    }
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Io(e) => write!(f, "IO error: {}", e),
            SinkError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SinkError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for SinkError {}

/// Receives scored predictions whenever the observer flushes them
pub trait ResultsSink {
    /// Report parallel sequences of predictions and true labels
    fn report(&mut self, y_pred: &[Label], y_true: &[Option<Label>]) -> Result<(), SinkError>;

    /// Flush pending writes to storage
    fn flush(&mut self) -> Result<(), SinkError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}
