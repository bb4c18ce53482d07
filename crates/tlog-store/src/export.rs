//! Read-only export views of a day buffer.
//!
//! [`ExportQuery`] selects which slots to emit; the writers render them as
//! JSON, CSV, or the raw file image.
//!
//! # Example
//!
//! ```
//! use tlog_store::{DayBuffer, ExportQuery, export};
//! use tlog_types::{LogDate, Sample};
//!
//! let mut buffer = DayBuffer::for_date(LogDate::new(2025, 12, 21)?)?;
//! buffer.insert(Sample::builder(0).temperature_raw(2050).humidity(55).build())?;
//!
//! // Every fifth minute of the morning, skipping empty slots
//! let query = ExportQuery::new().range(0, 719).step(5).valid_only();
//!
//! let mut out = Vec::new();
//! export::write_json(&buffer, &query, &mut out)?;
//! assert!(String::from_utf8(out).unwrap().starts_with(r#"{"date":"2025-12-21""#));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};
use tlog_types::{SAMPLE_SIZE, SAMPLES_PER_DAY, Sample, minute_label};

use crate::buffer::DayBuffer;
use crate::error::{Error, Result};

/// Records per write when streaming the binary image.
pub const BINARY_CHUNK_RECORDS: usize = 100;

/// Selection of slots for export.
///
/// By default every one of the 1440 slots is selected, including empty ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportQuery {
    /// First minute, inclusive.
    pub from: u16,
    /// Last minute, inclusive.
    pub to: u16,
    /// Emit every `step`-th minute starting at `from`.
    pub step: u16,
    /// Skip slots that hold no reading.
    pub valid_only: bool,
}

impl Default for ExportQuery {
    fn default() -> Self {
        Self {
            from: 0,
            to: (SAMPLES_PER_DAY - 1) as u16,
            step: 1,
            valid_only: false,
        }
    }
}

impl ExportQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to minutes `from..=to`.
    #[must_use]
    pub fn range(mut self, from: u16, to: u16) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    #[must_use]
    pub fn from_minute(mut self, from: u16) -> Self {
        self.from = from;
        self
    }

    #[must_use]
    pub fn to_minute(mut self, to: u16) -> Self {
        self.to = to;
        self
    }

    /// Decimate to every `step`-th minute. A step of 0 is treated as 1.
    #[must_use]
    pub fn step(mut self, step: u16) -> Self {
        self.step = step.max(1);
        self
    }

    #[must_use]
    pub fn valid_only(mut self) -> Self {
        self.valid_only = true;
        self
    }

    /// Slots of `buffer` matched by this query, in minute order.
    pub fn select<'a>(&self, buffer: &'a DayBuffer) -> impl Iterator<Item = &'a Sample> + use<'a> {
        let samples = buffer.samples();
        let from = usize::from(self.from).min(samples.len());
        let to = usize::from(self.to).min(samples.len().saturating_sub(1));
        let valid_only = self.valid_only;
        let slice = if from <= to && !samples.is_empty() {
            &samples[from..=to]
        } else {
            &samples[..0]
        };
        slice
            .iter()
            .step_by(usize::from(self.step.max(1)))
            .filter(move |s| !valid_only || s.is_valid())
    }
}

/// One exported minute, with `None` in place of sentinels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Minute of day as `HH:MM`.
    pub t: String,
    /// Temperature in °C.
    pub temp: Option<f32>,
    /// Humidity in %.
    pub hum: Option<u8>,
    /// Heater relay, 1 if on.
    pub heat: u8,
    /// Setpoint in °C.
    pub setpoint: Option<f32>,
    /// Pressure in hPa.
    pub press: Option<f32>,
}

impl From<&Sample> for ExportRecord {
    fn from(sample: &Sample) -> Self {
        Self {
            t: minute_label(sample.minute_of_day),
            temp: sample.temperature_celsius(),
            hum: sample.humidity_percent(),
            heat: u8::from(sample.relay_on()),
            setpoint: sample.setpoint_celsius(),
            press: sample.pressure_hpa(),
        }
    }
}

/// JSON document for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayExport {
    /// Date as `YYYY-MM-DD`.
    pub date: String,
    /// High-water mark of the buffer.
    pub samples: u16,
    pub data: Vec<ExportRecord>,
}

impl DayExport {
    pub fn from_buffer(buffer: &DayBuffer, query: &ExportQuery) -> Self {
        Self {
            date: buffer.date().to_string(),
            samples: buffer.num_samples(),
            data: query.select(buffer).map(ExportRecord::from).collect(),
        }
    }
}

/// Write the selected slots as a compact JSON document.
pub fn write_json<W: Write>(buffer: &DayBuffer, query: &ExportQuery, writer: W) -> Result<()> {
    if !buffer.is_initialized() {
        return Err(Error::NotInitialized);
    }
    serde_json::to_writer(writer, &DayExport::from_buffer(buffer, query))?;
    Ok(())
}

/// Column names of the CSV export, in field order of [`ExportRecord`].
pub const CSV_HEADER: [&str; 6] = ["t", "temp", "hum", "heat", "setpoint", "press"];

/// Write the selected slots as CSV. The header row is written even when the
/// selection is empty.
pub fn write_csv<W: Write>(buffer: &DayBuffer, query: &ExportQuery, writer: W) -> Result<()> {
    if !buffer.is_initialized() {
        return Err(Error::NotInitialized);
    }
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for sample in query.select(buffer) {
        wtr.serialize(ExportRecord::from(sample))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Stream the full file image (header then all 1440 records) in chunks of
/// [`BINARY_CHUNK_RECORDS`]. Returns the number of bytes written.
pub fn write_binary<W: Write>(buffer: &DayBuffer, mut writer: W) -> Result<usize> {
    if !buffer.is_initialized() {
        return Err(Error::NotInitialized);
    }

    let header = buffer.header().to_bytes();
    writer.write_all(&header)?;
    let mut written = header.len();

    let mut chunk = Vec::with_capacity(BINARY_CHUNK_RECORDS * SAMPLE_SIZE);
    for records in buffer.samples().chunks(BINARY_CHUNK_RECORDS) {
        chunk.clear();
        for sample in records {
            chunk.extend_from_slice(&sample.to_bytes());
        }
        writer.write_all(&chunk)?;
        written += chunk.len();
    }
    writer.flush()?;
    Ok(written)
}
