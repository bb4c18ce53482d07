//! Daily history buffer and file rotation for thermostat logs.
//!
//! This crate keeps one calendar day of one-per-minute samples in memory,
//! persists it as a fixed-layout `log_YYYYMMDD.bin` file, and rolls over to a
//! fresh buffer at each day boundary.
//!
//! # Features
//!
//! - [`DayBuffer`]: 1440 slots, insert-by-minute, dirty tracking, statistics
//! - [`LogDir`]: atomic save, tolerant load, O(1) single-minute reads,
//!   listing and retention cleanup
//! - [`HistoryManager`]: startup reconciliation and day-change rollover
//!   driven by a [`Clock`]
//! - [`export`]: JSON, CSV and binary views with range/decimation queries
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tlog_store::{HistoryManager, LogDir, ManualClock};
//! use tlog_types::{LogDate, Reading};
//!
//! let clock = Arc::new(ManualClock::new(LogDate::new(2025, 12, 21)?, 600));
//! let mut history = HistoryManager::new(LogDir::new("/var/lib/tlog"), clock);
//! history.init()?;
//!
//! let reading = Reading {
//!     temperature: 20.5,
//!     humidity: Some(55),
//!     pressure: Some(1013.2),
//!     setpoint: Some(21.0),
//!     relay_on: true,
//!     manual_mode: false,
//!     exception_active: false,
//!     active_bank: 0,
//! };
//! history.record(&reading)?;
//! println!("{:?}", history.stats());
//! history.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod buffer;
mod clock;
mod error;
pub mod export;
mod files;
mod rollover;

pub use buffer::{DayBuffer, DayStats};
pub use clock::{Clock, ManualClock};
pub use error::{Error, Result};
pub use export::{DayExport, ExportQuery, ExportRecord};
pub use files::{LoadReport, LogDir};
pub use rollover::{HistoryManager, Reconciliation, Rollover, Startup, reconcile};

/// Default log directory following platform conventions.
///
/// - Linux: `~/.local/share/tlog/logs`
/// - macOS: `~/Library/Application Support/tlog/logs`
/// - Windows: `C:\Users\<user>\AppData\Local\tlog\logs`
pub fn default_log_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("tlog")
        .join("logs")
}
