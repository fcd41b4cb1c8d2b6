use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const FAILURE_LOG_NAME: &str = "failed_conversions.log";

#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub timestamp: DateTime<Local>,
    pub filename: String,
    pub detail: String,
}

impl FailureRecord {
    pub fn now(filename: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            filename: filename.into(),
            detail: detail.into(),
        }
    }

    fn render(&self) -> String {
        format!(
            "{} - {}:\n{}\n\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"),
            self.filename,
            self.detail.trim_end(),
        )
    }
}

/// Append-only plain-text log of failed conversions. Cheap to clone; every
/// append opens the file in append mode so the worker and the interface can
/// both write to it.
#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `failed_conversions.log` in the process working directory.
    pub fn in_working_dir() -> Self {
        Self::new(FAILURE_LOG_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &FailureRecord) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.render().as_bytes())
    }

    /// Appends and reports a write failure to the tracing log instead of the
    /// caller; the failure log is never allowed to break a job.
    pub fn record(&self, filename: impl Into<String>, detail: impl Into<String>) {
        let record = FailureRecord::now(filename, detail);
        if let Err(e) = self.append(&record) {
            tracing::error!("Could not write to {}: {}", self.path().display(), e);
        }
    }
}
