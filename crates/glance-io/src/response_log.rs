use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Append-only, human-readable record of every answer
///
/// The file is opened, appended and closed per record, so concurrent runs
/// never tear a record (records from different runs may interleave).
#[derive(Debug, Clone)]
pub struct ResponseLog {
    path: PathBuf,
}

impl ResponseLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, answer: &str) -> io::Result<()> {
        self.append_at(answer, Local::now())
    }

    pub fn append_at(&self, answer: &str, at: DateTime<Local>) -> io::Result<()> {
        let record = format_record(answer, at);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.as_bytes())?;
        tracing::info!("Answer recorded in {}", self.path.display());
        Ok(())
    }
}

fn format_record(answer: &str, at: DateTime<Local>) -> String {
    format!("\n[{}] {}\n", at.format("%Y-%m-%d %H:%M:%S"), answer)
}
