//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use serde::Serialize;
use tlog_store::{DayStats, ExportRecord, export};
use tlog_types::{LogDate, Sample};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_header: bool, compact: bool) -> Self {
        Self { no_header, compact }
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    /// Serialize rows as CSV, respecting the no_header option.
    pub fn as_csv<T: Serialize>(&self, rows: impl IntoIterator<Item = T>) -> Result<String> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(!self.no_header)
            .from_writer(Vec::new());
        for row in rows {
            wtr.serialize(row)?;
        }
        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// One stored day, as reported by `tlog list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEntry {
    pub date: String,
    pub file: String,
    pub bytes: u64,
    /// Header sample count, or `None` if the file could not be read.
    pub samples: Option<u16>,
}

pub fn format_days_text(days: &[DayEntry]) -> String {
    if days.is_empty() {
        return "No day files found.\n".to_string();
    }
    let mut output = format!("{:<12} {:<18} {:>8} {:>8}\n", "DATE", "FILE", "BYTES", "SAMPLES");
    for day in days {
        let samples = day
            .samples
            .map(|n| n.to_string())
            .unwrap_or_else(|| "corrupt".to_string());
        output.push_str(&format!(
            "{:<12} {:<18} {:>8} {:>8}\n",
            day.date, day.file, day.bytes, samples
        ));
    }
    output
}

fn opt<T: std::fmt::Display>(value: Option<T>, width: usize, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:>width$.precision$}"),
        None => format!("{:>width$}", "--"),
    }
}

/// Table of samples, one line per minute.
pub fn format_samples_text(date: LogDate, samples: &[Sample]) -> String {
    let mut output = format!("{date}: {} sample(s)\n", samples.len());
    if samples.is_empty() {
        return output;
    }
    output.push_str(&format!(
        "{:<6} {:>7} {:>4} {:>4} {:>8} {:>7} {:>4}\n",
        "TIME", "TEMP", "HUM", "HEAT", "SETPOINT", "PRESS", "BANK"
    ));
    for s in samples {
        let hum = s
            .humidity_percent()
            .map(|h| format!("{h:>4}"))
            .unwrap_or_else(|| format!("{:>4}", "--"));
        output.push_str(&format!(
            "{:<6} {} {} {:>4} {} {} {:>4}\n",
            tlog_types::minute_label(s.minute_of_day),
            opt(s.temperature_celsius(), 7, 2),
            hum,
            if s.relay_on() { "on" } else { "off" },
            opt(s.setpoint_celsius(), 8, 2),
            opt(s.pressure_hpa(), 7, 1),
            s.active_bank,
        ));
    }
    output
}

/// Samples as CSV, with the export column header even for an empty list.
pub fn format_samples_csv(samples: &[Sample], opts: &FormatOptions) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if !opts.no_header {
        wtr.write_record(export::CSV_HEADER)?;
    }
    for sample in samples {
        wtr.serialize(ExportRecord::from(sample))?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Statistics for one day, as emitted by `tlog stats`.
///
/// Flat so the same row serializes to JSON and CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub date: String,
    pub samples: u16,
    pub valid_samples: u16,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub mean_temperature: f32,
    pub heater_on_minutes: u16,
}

impl StatsReport {
    pub fn new(date: LogDate, samples: u16, stats: DayStats) -> Self {
        Self {
            date: date.to_string(),
            samples,
            valid_samples: stats.valid_samples,
            min_temperature: stats.min_temperature,
            max_temperature: stats.max_temperature,
            mean_temperature: stats.mean_temperature,
            heater_on_minutes: stats.heater_on_minutes,
        }
    }
}

pub fn format_stats_text(report: &StatsReport) -> String {
    let mut output = format!("Date:              {}\n", report.date);
    output.push_str(&format!("Samples recorded:  {}\n", report.samples));
    output.push_str(&format!("Valid minutes:     {}\n", report.valid_samples));
    if report.valid_samples == 0 {
        output.push_str("No temperature readings.\n");
        return output;
    }
    output.push_str(&format!(
        "Temperature:       min {:.2} °C, max {:.2} °C, mean {:.2} °C\n",
        report.min_temperature, report.max_temperature, report.mean_temperature
    ));
    output.push_str(&format!(
        "Heater on:         {} min ({}h {:02}m)\n",
        report.heater_on_minutes,
        report.heater_on_minutes / 60,
        report.heater_on_minutes % 60
    ));
    output
}
