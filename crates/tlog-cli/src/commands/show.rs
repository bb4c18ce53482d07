//! Show command - print samples of one day.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tlog_store::{Error, ExportQuery, ExportRecord, LogDir};
use tlog_types::{LogDate, Sample, minute_label};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_samples_csv, format_samples_text};
use crate::util::write_output;

/// Arguments for the show command.
pub struct ShowArgs<'a> {
    pub date: LogDate,
    /// Single minute, read with one seek instead of loading the day.
    pub minute: Option<u16>,
    pub query: ExportQuery,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub opts: &'a FormatOptions,
}

pub fn cmd_show(dir: &LogDir, args: ShowArgs<'_>) -> Result<()> {
    let ShowArgs {
        date,
        minute,
        query,
        format,
        output,
        opts,
    } = args;

    let samples: Vec<Sample> = match minute {
        Some(minute) => match dir.read_sample(date, minute) {
            Ok(sample) => vec![sample],
            Err(Error::SampleNotFound(_)) => {
                bail!("No reading recorded at {} on {}", minute_label(minute), date)
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", date)),
        },
        None => {
            let buffer = dir
                .load(date)
                .with_context(|| format!("Failed to load {}", date))?;
            query.select(&buffer).copied().collect()
        }
    };

    let content = match format {
        OutputFormat::Text => format_samples_text(date, &samples),
        OutputFormat::Json => {
            let records: Vec<ExportRecord> = samples.iter().map(ExportRecord::from).collect();
            opts.as_json(&records)?
        }
        OutputFormat::Csv => format_samples_csv(&samples, opts)?,
    };
    write_output(output, &content)
}
