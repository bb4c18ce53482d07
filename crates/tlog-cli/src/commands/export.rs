//! Export command - stream a day as JSON, CSV or the raw file image.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tlog_store::{ExportQuery, LogDir, export};
use tlog_types::LogDate;
use tracing::debug;

use crate::cli::ExportFormat;
use crate::util::open_output;

/// Arguments for the export command.
pub struct ExportArgs<'a> {
    pub date: LogDate,
    pub format: ExportFormat,
    pub query: ExportQuery,
    pub output: Option<&'a PathBuf>,
}

pub fn cmd_export(dir: &LogDir, args: ExportArgs<'_>) -> Result<()> {
    let ExportArgs {
        date,
        format,
        query,
        output,
    } = args;

    if format == ExportFormat::Bin && output.is_none() && io::stdout().is_terminal() {
        bail!("Refusing to write binary data to a terminal. Use --output <FILE> or redirect stdout.");
    }

    let buffer = dir
        .load(date)
        .with_context(|| format!("Failed to load {}", date))?;
    let mut out = open_output(output)?;

    match format {
        ExportFormat::Json => {
            export::write_json(&buffer, &query, &mut out)?;
            writeln!(out)?;
        }
        ExportFormat::Csv => export::write_csv(&buffer, &query, &mut out)?,
        ExportFormat::Bin => {
            let written = export::write_binary(&buffer, &mut out)?;
            debug!("Wrote {} bytes for {}", written, date);
        }
    }
    out.flush()?;
    Ok(())
}
