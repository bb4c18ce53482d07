//! Stats command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tlog_store::LogDir;
use tlog_types::LogDate;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, StatsReport, format_stats_text};
use crate::util::write_output;

pub fn cmd_stats(
    dir: &LogDir,
    date: LogDate,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let buffer = dir
        .load(date)
        .with_context(|| format!("Failed to load {}", date))?;

    let report = StatsReport::new(date, buffer.num_samples(), buffer.stats());

    let content = match format {
        OutputFormat::Text => format_stats_text(&report),
        OutputFormat::Json => opts.as_json(&report)?,
        OutputFormat::Csv => opts.as_csv([&report])?,
    };
    write_output(output, &content)
}
