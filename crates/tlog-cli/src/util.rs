//! Utility functions for CLI operations.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::OffsetDateTime;
use tlog_store::LogDir;
use tlog_types::{LogDate, SAMPLES_PER_DAY};

/// Resolve the log directory from `--dir`/`TLOG_DIR`, falling back to the
/// platform default.
pub fn log_dir(dir: Option<&Path>) -> LogDir {
    match dir {
        Some(path) => LogDir::new(path),
        None => LogDir::new(tlog_store::default_log_dir()),
    }
}

/// Today's local date, or the UTC date when the local offset is unknown.
pub fn today() -> Result<LogDate> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    LogDate::try_from(now.date()).context("Current date is out of range")
}

/// `date` if given, otherwise today.
pub fn date_or_today(date: Option<LogDate>) -> Result<LogDate> {
    match date {
        Some(date) => Ok(date),
        None => today(),
    }
}

/// Parse a minute of day given as `HH:MM` or as a plain number.
pub fn parse_minute(s: &str) -> Result<u16, String> {
    let minute = match s.split_once(':') {
        Some((h, m)) => {
            let h: u16 = h.parse().map_err(|_| format!("invalid hour in '{s}'"))?;
            let m: u16 = m.parse().map_err(|_| format!("invalid minute in '{s}'"))?;
            if h > 23 || m > 59 {
                return Err(format!("'{s}' is not a time of day"));
            }
            h * 60 + m
        }
        None => s
            .parse()
            .map_err(|_| format!("'{s}' is neither HH:MM nor a minute of day"))?,
    };
    if usize::from(minute) >= SAMPLES_PER_DAY {
        return Err(format!(
            "minute {minute} out of range (0-{})",
            SAMPLES_PER_DAY - 1
        ));
    }
    Ok(minute)
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// Open a streaming writer on the output file or stdout.
pub fn open_output(output: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
