//! List command - enumerate stored days.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tlog_store::LogDir;
use tracing::warn;

use crate::cli::OutputFormat;
use crate::format::{DayEntry, FormatOptions, format_days_text};
use crate::util::write_output;

pub fn cmd_list(
    dir: &LogDir,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let days = dir
        .list()
        .with_context(|| format!("Failed to list {}", dir.root().display()))?;

    let entries: Vec<DayEntry> = days
        .into_iter()
        .map(|date| {
            let bytes = std::fs::metadata(dir.path_for(date))
                .map(|m| m.len())
                .unwrap_or(0);
            let samples = match dir.load(date) {
                Ok(buffer) => Some(buffer.num_samples()),
                Err(e) => {
                    warn!("Skipping unreadable {}: {}", date.filename(), e);
                    None
                }
            };
            DayEntry {
                date: date.to_string(),
                file: date.filename(),
                bytes,
                samples,
            }
        })
        .collect();

    let content = match format {
        OutputFormat::Text => format_days_text(&entries),
        OutputFormat::Json => opts.as_json(&entries)?,
        OutputFormat::Csv => opts.as_csv(&entries)?,
    };
    write_output(output, &content)
}
