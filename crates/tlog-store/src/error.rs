//! Error types for tlog-store.

use std::path::PathBuf;

use tlog_types::{LogDate, ParseError};

/// Result type for tlog-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tlog-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The day buffer has not been allocated and initialized.
    #[error("History buffer not initialized")]
    NotInitialized,

    /// An argument was out of range (e.g. a minute index past 1439).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No day file exists for the requested date.
    #[error("No log file for {date} at {}", path.display())]
    FileNotFound { date: LogDate, path: PathBuf },

    /// The requested minute holds no reading.
    #[error("No sample recorded at minute {0}")]
    SampleNotFound(u16),

    /// A day file exists but is not in the expected format.
    #[error("Invalid log file {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Filesystem I/O failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An export destination could not be written.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// A background task doing file work panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),

    /// The day buffer could not be allocated.
    #[error("Failed to allocate {bytes} bytes for history buffer")]
    OutOfMemory { bytes: usize },

    /// Malformed date or record.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is one of the expected "nothing there" outcomes: a
    /// missing day file or an un-recorded minute.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. } | Self::SampleNotFound(_))
    }
}
