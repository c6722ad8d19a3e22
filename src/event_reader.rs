//! JSONL event source

use crate::event::Event;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug)]
pub enum EventError {
    Io(std::io::Error),
    Parse { line: usize, source: serde_json::Error },
}

impl From<std::io::Error> for EventError {
    fn from(err: std::io::Error) -> Self {
        EventError::Io(err)
    }
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventError::Io(e) => write!(f, "IO error: {}", e),
            EventError::Parse { line, source } => {
                write!(f, "Malformed event on line {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EventError::Io(e) => Some(e),
            EventError::Parse { source, .. } => Some(source),
        }
    }
}

/// Iterator over the events of a JSONL stream, skipping blank lines
pub struct EventReader<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl EventReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let file = File::open(path.as_ref())?;
        log::info!("📖 Reading events from: {}", path.as_ref().display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<Event, EventError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(EventError::Io(e))),
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Some(serde_json::from_str(trimmed).map_err(|source| EventError::Parse {
                line: self.line_number,
                source,
            }));
        }
    }
}
