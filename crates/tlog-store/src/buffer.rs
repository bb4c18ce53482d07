//! The in-memory day buffer: one slot per minute of the current day.

use serde::{Deserialize, Serialize};
use tlog_types::{LogDate, LogHeader, SAMPLES_PER_DAY, Sample};

use crate::error::{Error, Result};

/// Aggregate statistics over the valid slots of a day buffer.
///
/// Temperatures are in °C. With no valid slot every field is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    /// Lowest recorded temperature.
    pub min_temperature: f32,
    /// Highest recorded temperature.
    pub max_temperature: f32,
    /// Mean of all recorded temperatures.
    pub mean_temperature: f32,
    /// Valid minutes with the heater relay on.
    pub heater_on_minutes: u16,
    /// Number of valid minutes.
    pub valid_samples: u16,
}

/// 1440-slot array for one calendar day plus its header and bookkeeping.
///
/// A fresh buffer from [`DayBuffer::new`] is unallocated; call
/// [`DayBuffer::init_for_date`] before inserting.
#[derive(Debug, Clone)]
pub struct DayBuffer {
    pub(crate) header: LogHeader,
    pub(crate) samples: Vec<Sample>,
    pub(crate) current_minute: u16,
    pub(crate) initialized: bool,
    pub(crate) dirty: bool,
}

impl Default for DayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DayBuffer {
    /// An unallocated, uninitialized buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            header: LogHeader::new(LogDate {
                year: 0,
                month: 0,
                day: 0,
            }),
            samples: Vec::new(),
            current_minute: 0,
            initialized: false,
            dirty: false,
        }
    }

    /// Allocate and initialize a buffer for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the slot array cannot be allocated.
    pub fn for_date(date: LogDate) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.init_for_date(date)?;
        Ok(buffer)
    }

    /// Reset every slot to its sentinel form and stamp the header with `date`.
    ///
    /// Allocates on first use; later calls reuse the existing allocation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the slot array cannot be allocated.
    pub fn init_for_date(&mut self, date: LogDate) -> Result<()> {
        if self.samples.capacity() < SAMPLES_PER_DAY {
            self.samples.clear();
            self.samples
                .try_reserve_exact(SAMPLES_PER_DAY)
                .map_err(|_| Error::OutOfMemory {
                    bytes: SAMPLES_PER_DAY * std::mem::size_of::<Sample>(),
                })?;
        }

        self.samples.clear();
        self.samples
            .extend((0..SAMPLES_PER_DAY as u16).map(Sample::empty));
        self.header = LogHeader::new(date);
        self.current_minute = 0;
        self.dirty = false;
        self.initialized = true;
        Ok(())
    }

    /// Move the header to `date`, keeping every slot. Marks the buffer dirty.
    pub(crate) fn restamp(&mut self, date: LogDate) {
        self.header.year = date.year;
        self.header.month = date.month;
        self.header.day = date.day;
        self.dirty = true;
    }

    /// Free the slot array. The buffer must be re-initialized before use.
    pub fn release(&mut self) {
        self.samples = Vec::new();
        self.initialized = false;
        self.dirty = false;
    }

    /// Store `sample` in the slot given by its minute, replacing whatever was
    /// there.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] before [`init_for_date`](Self::init_for_date)
    /// - [`Error::InvalidArgument`] if the minute is 1440 or more
    pub fn insert(&mut self, sample: Sample) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let minute = sample.minute_of_day;
        let slot = self
            .samples
            .get_mut(usize::from(minute))
            .ok_or_else(|| invalid_minute(minute))?;
        *slot = sample;

        self.header.num_samples = self.header.num_samples.max(minute + 1);
        self.current_minute = minute;
        self.dirty = true;
        Ok(())
    }

    /// Copy of the sample at `minute`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] before initialization
    /// - [`Error::InvalidArgument`] if the minute is out of range
    /// - [`Error::SampleNotFound`] if the slot holds no reading
    pub fn get(&self, minute: u16) -> Result<Sample> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let sample = self
            .samples
            .get(usize::from(minute))
            .ok_or_else(|| invalid_minute(minute))?;
        if sample.is_valid() {
            Ok(*sample)
        } else {
            Err(Error::SampleNotFound(minute))
        }
    }

    /// Temperature and heater statistics over valid slots.
    #[must_use]
    pub fn stats(&self) -> DayStats {
        let mut min = i16::MAX;
        let mut max = i16::MIN;
        let mut sum: i64 = 0;
        let mut valid: u16 = 0;
        let mut heater_on: u16 = 0;

        for sample in self.samples.iter().filter(|s| s.is_valid()) {
            min = min.min(sample.temperature);
            max = max.max(sample.temperature);
            sum += i64::from(sample.temperature);
            valid += 1;
            if sample.relay_on() {
                heater_on += 1;
            }
        }

        if valid == 0 {
            return DayStats::default();
        }

        DayStats {
            min_temperature: f32::from(min) / 100.0,
            max_temperature: f32::from(max) / 100.0,
            mean_temperature: (sum as f64 / f64::from(valid) / 100.0) as f32,
            heater_on_minutes: heater_on,
            valid_samples: valid,
        }
    }

    /// All 1440 slots in minute order (empty if unallocated).
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterator over slots that hold a reading.
    pub fn valid_samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(|s| s.is_valid())
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    /// The day this buffer represents.
    pub fn date(&self) -> LogDate {
        self.header.date()
    }

    /// Write high-water mark: highest minute ever written plus one.
    pub fn num_samples(&self) -> u16 {
        self.header.num_samples
    }

    /// Last minute written.
    pub fn current_minute(&self) -> u16 {
        self.current_minute
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the buffer differs from its file on disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

fn invalid_minute(minute: u16) -> Error {
    Error::InvalidArgument(format!(
        "minute {minute} out of range (0-{})",
        SAMPLES_PER_DAY - 1
    ))
}
