//! Core types for daily log files: dates, headers, samples and readings.

use core::fmt;
use core::str::FromStr;

use bytes::{Buf, BufMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, ParseResult};

/// Number of one-minute slots in a day buffer and in every day file.
pub const SAMPLES_PER_DAY: usize = 1440;

/// Size of the encoded file header in bytes.
pub const HEADER_SIZE: usize = 12;

/// Size of one encoded sample record in bytes.
pub const SAMPLE_SIZE: usize = 12;

/// Size of a complete day file: header followed by every slot of the day.
pub const FILE_SIZE: usize = HEADER_SIZE + SAMPLES_PER_DAY * SAMPLE_SIZE;

/// Magic bytes at the start of every day file.
pub const MAGIC: [u8; 4] = *b"TLOG";

/// Format version written by this crate.
pub const FORMAT_VERSION: u8 = 1;

/// Temperature value meaning "no reading".
pub const TEMPERATURE_SENTINEL: i16 = i16::MIN;

/// Humidity value meaning "no reading".
pub const HUMIDITY_SENTINEL: u8 = 255;

/// Setpoint value meaning "not applicable".
pub const SETPOINT_SENTINEL: i16 = i16::MIN;

/// Pressure value meaning "no reading".
pub const PRESSURE_SENTINEL: u16 = 0;

/// File name prefix shared by all day files.
pub const FILE_PREFIX: &str = "log_";

/// File name suffix shared by all day files.
pub const FILE_SUFFIX: &str = ".bin";

/// Byte offset of the record for `minute_of_day` inside a day file.
///
/// ```
/// use tlog_types::record_offset;
///
/// assert_eq!(record_offset(0), 12);
/// assert_eq!(record_offset(1439), 12 + 1439 * 12);
/// ```
#[must_use]
pub const fn record_offset(minute_of_day: u16) -> usize {
    HEADER_SIZE + minute_of_day as usize * SAMPLE_SIZE
}

/// Format a minute of the day as `HH:MM`.
///
/// ```
/// assert_eq!(tlog_types::minute_label(0), "00:00");
/// assert_eq!(tlog_types::minute_label(754), "12:34");
/// ```
#[must_use]
pub fn minute_label(minute_of_day: u16) -> String {
    format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
}

/// Calendar date a day buffer or day file belongs to.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LogDate {
    /// Calendar year.
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
}

impl LogDate {
    /// Create a validated calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidDate`] if the triple is not a real date.
    pub fn new(year: u16, month: u8, day: u8) -> ParseResult<Self> {
        let date = Self { year, month, day };
        date.to_date()?;
        Ok(date)
    }

    /// Convert to a [`time::Date`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidDate`] if the stored triple is not a real
    /// date (headers read from disk are not validated).
    pub fn to_date(&self) -> ParseResult<time::Date> {
        let month = time::Month::try_from(self.month)
            .map_err(|_| ParseError::InvalidDate(format!("month {} out of range", self.month)))?;
        time::Date::from_calendar_date(i32::from(self.year), month, self.day)
            .map_err(|e| ParseError::InvalidDate(format!("{self}: {e}")))
    }

    /// Date `days` days before this one, if representable.
    pub fn checked_sub_days(&self, days: u16) -> Option<Self> {
        let date = self.to_date().ok()?;
        let earlier = date.checked_sub(time::Duration::days(i64::from(days)))?;
        Self::try_from(earlier).ok()
    }

    /// Compact `YYYYMMDD` form used inside file names.
    #[must_use]
    pub fn compact(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }

    /// Deterministic file name for this date, e.g. `log_20251221.bin`.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("{FILE_PREFIX}{}{FILE_SUFFIX}", self.compact())
    }

    /// Recover the date embedded in a day file name.
    ///
    /// Returns `None` for anything that is not exactly `log_YYYYMMDD.bin`
    /// with a valid calendar date.
    ///
    /// ```
    /// use tlog_types::LogDate;
    ///
    /// let date = LogDate::from_filename("log_20251221.bin").unwrap();
    /// assert_eq!((date.year, date.month, date.day), (2025, 12, 21));
    /// assert!(LogDate::from_filename("log_20251221.bin.tmp").is_none());
    /// assert!(LogDate::from_filename("config.json").is_none());
    /// ```
    #[must_use]
    pub fn from_filename(name: &str) -> Option<Self> {
        let compact = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
        Self::parse_compact(compact).ok()
    }

    fn parse_compact(s: &str) -> ParseResult<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidDate(format!(
                "'{s}' is not in YYYYMMDD form"
            )));
        }
        // All-digit input of fixed width cannot overflow these types.
        let year: u16 = s[0..4].parse().map_err(|_| invalid_date(s))?;
        let month: u8 = s[4..6].parse().map_err(|_| invalid_date(s))?;
        let day: u8 = s[6..8].parse().map_err(|_| invalid_date(s))?;
        Self::new(year, month, day)
    }
}

fn invalid_date(s: &str) -> ParseError {
    ParseError::InvalidDate(format!("'{s}' is not a date"))
}

impl FromStr for LogDate {
    type Err = ParseError;

    /// Parse `YYYYMMDD` or `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == 10 && s.as_bytes()[4] == b'-' && s.as_bytes()[7] == b'-' {
            let compact: String = s.chars().filter(|c| *c != '-').collect();
            return Self::parse_compact(&compact);
        }
        Self::parse_compact(s)
    }
}

impl TryFrom<time::Date> for LogDate {
    type Error = ParseError;

    fn try_from(date: time::Date) -> Result<Self, Self::Error> {
        let year = u16::try_from(date.year())
            .map_err(|_| ParseError::InvalidDate(format!("year {} out of range", date.year())))?;
        Ok(Self {
            year,
            month: u8::from(date.month()),
            day: date.day(),
        })
    }
}

impl fmt::Display for LogDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// 12-byte header at the start of every day file.
///
/// Fields are kept exactly as read so that a load/save cycle reproduces the
/// original bytes. The magic is not checked here; callers decide what to do
/// with a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogHeader {
    /// Magic bytes, `TLOG` for well-formed files.
    pub magic: [u8; 4],
    /// Format version.
    pub version: u8,
    /// Year of the day this file represents.
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of month (1-31).
    pub day: u8,
    /// Highest minute ever written plus one (high-water mark, not a count).
    pub num_samples: u16,
    /// Reserved, preserved as read.
    pub reserved: u8,
}

impl LogHeader {
    /// Fresh header for `date` with no samples written.
    #[must_use]
    pub fn new(date: LogDate) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            year: date.year,
            month: date.month,
            day: date.day,
            num_samples: 0,
            reserved: 0,
        }
    }

    /// The date stored in this header (not validated).
    #[must_use]
    pub fn date(&self) -> LogDate {
        LogDate {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }

    /// Whether the magic bytes read `TLOG`.
    #[must_use]
    pub fn has_valid_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Whether the version matches [`FORMAT_VERSION`].
    #[must_use]
    pub fn is_current_version(&self) -> bool {
        self.version == FORMAT_VERSION
    }

    /// Encode to the on-disk layout (little-endian).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let mut buf = &mut out[..];
        buf.put_slice(&self.magic);
        buf.put_u8(self.version);
        buf.put_u16_le(self.year);
        buf.put_u8(self.month);
        buf.put_u8(self.day);
        buf.put_u16_le(self.num_samples);
        buf.put_u8(self.reserved);
        out
    }

    /// Decode from the on-disk layout. Never fails.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        Self {
            magic,
            version: buf.get_u8(),
            year: buf.get_u16_le(),
            month: buf.get_u8(),
            day: buf.get_u8(),
            num_samples: buf.get_u16_le(),
            reserved: buf.get_u8(),
        }
    }

    /// Decode from the first [`HEADER_SIZE`] bytes of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InsufficientBytes`] if `data` is too short.
    pub fn decode(data: &[u8]) -> ParseResult<Self> {
        let bytes: &[u8; HEADER_SIZE] = data
            .get(..HEADER_SIZE)
            .and_then(|s| s.try_into().ok())
            .ok_or(ParseError::InsufficientBytes {
                expected: HEADER_SIZE,
                actual: data.len(),
            })?;
        Ok(Self::from_bytes(bytes))
    }
}

/// Flag bits stored in each sample.
///
/// Unknown bits are carried through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SampleFlags(u8);

impl SampleFlags {
    /// Relay (heater) energized.
    pub const RELAY_ON: Self = Self(0x01);
    /// Thermostat in manual mode.
    pub const MANUAL_MODE: Self = Self(0x02);
    /// A schedule exception was active.
    pub const EXCEPTION: Self = Self(0x04);

    /// No bits set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wrap raw bits, keeping reserved bits as they are.
    #[must_use]
    pub const fn from_bits_retain(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear the bits of `other`.
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl core::ops::BitOr for SampleFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One minute of logged data, in its fixed-point storage form.
///
/// Binary format (little-endian, 12 bytes):
/// - bytes 0-1: minute of day (u16)
/// - bytes 2-3: temperature ×100 (i16, `-32768` = no reading)
/// - byte 4: humidity % (u8, `255` = no reading)
/// - byte 5: flags (u8)
/// - bytes 6-7: setpoint ×100 (i16, `-32768` = not applicable)
/// - byte 8: active program bank (u8)
/// - byte 9: reserved (u8)
/// - bytes 10-11: pressure ×10 hPa (u16, `0` = no reading)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Position within the day (0-1439); doubles as the slot index.
    pub minute_of_day: u16,
    /// Temperature in hundredths of a degree Celsius.
    pub temperature: i16,
    /// Relative humidity percentage.
    pub humidity: u8,
    /// Relay/mode flags.
    pub flags: SampleFlags,
    /// Active setpoint in hundredths of a degree Celsius.
    pub setpoint: i16,
    /// Schedule program bank that was active (0-3).
    pub active_bank: u8,
    /// Reserved, preserved as stored.
    pub reserved: u8,
    /// Pressure in tenths of hPa.
    pub pressure: u16,
}

impl Sample {
    /// A slot with every field at its sentinel.
    #[must_use]
    pub const fn empty(minute_of_day: u16) -> Self {
        Self {
            minute_of_day,
            temperature: TEMPERATURE_SENTINEL,
            humidity: HUMIDITY_SENTINEL,
            flags: SampleFlags::empty(),
            setpoint: SETPOINT_SENTINEL,
            active_bank: 0,
            reserved: 0,
            pressure: PRESSURE_SENTINEL,
        }
    }

    /// Create a builder for a sample at `minute_of_day`.
    pub fn builder(minute_of_day: u16) -> SampleBuilder {
        SampleBuilder {
            sample: Self::empty(minute_of_day),
        }
    }

    /// A sample holds data iff its temperature is not the sentinel.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.temperature != TEMPERATURE_SENTINEL
    }

    /// Temperature in °C, `None` for the sentinel.
    #[must_use]
    pub fn temperature_celsius(&self) -> Option<f32> {
        (self.temperature != TEMPERATURE_SENTINEL).then(|| f32::from(self.temperature) / 100.0)
    }

    /// Humidity in %, `None` for the sentinel.
    #[must_use]
    pub fn humidity_percent(&self) -> Option<u8> {
        (self.humidity != HUMIDITY_SENTINEL).then_some(self.humidity)
    }

    /// Setpoint in °C, `None` for the sentinel.
    #[must_use]
    pub fn setpoint_celsius(&self) -> Option<f32> {
        (self.setpoint != SETPOINT_SENTINEL).then(|| f32::from(self.setpoint) / 100.0)
    }

    /// Pressure in hPa, `None` for the sentinel.
    #[must_use]
    pub fn pressure_hpa(&self) -> Option<f32> {
        (self.pressure != PRESSURE_SENTINEL).then(|| f32::from(self.pressure) / 10.0)
    }

    /// Whether the heater relay was on.
    #[must_use]
    pub const fn relay_on(&self) -> bool {
        self.flags.contains(SampleFlags::RELAY_ON)
    }

    /// Whether the thermostat was in manual mode.
    #[must_use]
    pub const fn manual_mode(&self) -> bool {
        self.flags.contains(SampleFlags::MANUAL_MODE)
    }

    /// Whether a schedule exception was active.
    #[must_use]
    pub const fn exception_active(&self) -> bool {
        self.flags.contains(SampleFlags::EXCEPTION)
    }

    /// Encode to the 12-byte record layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SAMPLE_SIZE] {
        let mut out = [0u8; SAMPLE_SIZE];
        let mut buf = &mut out[..];
        buf.put_u16_le(self.minute_of_day);
        buf.put_i16_le(self.temperature);
        buf.put_u8(self.humidity);
        buf.put_u8(self.flags.bits());
        buf.put_i16_le(self.setpoint);
        buf.put_u8(self.active_bank);
        buf.put_u8(self.reserved);
        buf.put_u16_le(self.pressure);
        out
    }

    /// Decode a 12-byte record. Never fails; out-of-range values are kept.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; SAMPLE_SIZE]) -> Self {
        let mut buf = &bytes[..];
        Self {
            minute_of_day: buf.get_u16_le(),
            temperature: buf.get_i16_le(),
            humidity: buf.get_u8(),
            flags: SampleFlags::from_bits_retain(buf.get_u8()),
            setpoint: buf.get_i16_le(),
            active_bank: buf.get_u8(),
            reserved: buf.get_u8(),
            pressure: buf.get_u16_le(),
        }
    }

    /// Decode from the first [`SAMPLE_SIZE`] bytes of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InsufficientBytes`] if `data` is too short.
    pub fn decode(data: &[u8]) -> ParseResult<Self> {
        let bytes: &[u8; SAMPLE_SIZE] = data
            .get(..SAMPLE_SIZE)
            .and_then(|s| s.try_into().ok())
            .ok_or(ParseError::InsufficientBytes {
                expected: SAMPLE_SIZE,
                actual: data.len(),
            })?;
        Ok(Self::from_bytes(bytes))
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", minute_label(self.minute_of_day))?;
        match self.temperature_celsius() {
            Some(t) => write!(f, " {t:.2}°C")?,
            None => return write!(f, " --"),
        }
        if let Some(h) = self.humidity_percent() {
            write!(f, " {h}%")?;
        }
        if let Some(p) = self.pressure_hpa() {
            write!(f, " {p:.1} hPa")?;
        }
        if let Some(sp) = self.setpoint_celsius() {
            write!(f, " sp {sp:.2}°C")?;
        }
        write!(
            f,
            " bank {} {}",
            self.active_bank,
            if self.relay_on() { "ON" } else { "OFF" }
        )
    }
}

/// Builder for constructing a [`Sample`] field by field.
///
/// Every field not set stays at its sentinel.
#[derive(Debug)]
#[must_use]
pub struct SampleBuilder {
    sample: Sample,
}

impl SampleBuilder {
    /// Set temperature from °C (scaled ×100, rounded).
    pub fn temperature(mut self, celsius: f32) -> Self {
        self.sample.temperature = celsius_to_fixed(celsius);
        self
    }

    /// Set temperature in hundredths of a degree.
    pub fn temperature_raw(mut self, raw: i16) -> Self {
        self.sample.temperature = raw;
        self
    }

    /// Set humidity percentage.
    pub fn humidity(mut self, humidity: u8) -> Self {
        self.sample.humidity = humidity;
        self
    }

    /// Replace all flags.
    pub fn flags(mut self, flags: SampleFlags) -> Self {
        self.sample.flags = flags;
        self
    }

    /// Set or clear the relay flag.
    pub fn relay_on(mut self, on: bool) -> Self {
        self.sample.flags.set(SampleFlags::RELAY_ON, on);
        self
    }

    /// Set setpoint from °C (scaled ×100, rounded).
    pub fn setpoint(mut self, celsius: f32) -> Self {
        self.sample.setpoint = celsius_to_fixed(celsius);
        self
    }

    /// Set setpoint in hundredths of a degree.
    pub fn setpoint_raw(mut self, raw: i16) -> Self {
        self.sample.setpoint = raw;
        self
    }

    /// Set the active program bank.
    pub fn active_bank(mut self, bank: u8) -> Self {
        self.sample.active_bank = bank;
        self
    }

    /// Set pressure from hPa (scaled ×10, rounded).
    pub fn pressure(mut self, hpa: f32) -> Self {
        self.sample.pressure = hpa_to_fixed(hpa);
        self
    }

    /// Set pressure in tenths of hPa.
    pub fn pressure_raw(mut self, raw: u16) -> Self {
        self.sample.pressure = raw;
        self
    }

    /// Build the sample.
    #[must_use]
    pub fn build(self) -> Sample {
        self.sample
    }
}

/// Scale °C to hundredths, keeping real readings off the sentinel.
///
/// Non-finite input maps to the sentinel.
fn celsius_to_fixed(celsius: f32) -> i16 {
    if !celsius.is_finite() {
        return TEMPERATURE_SENTINEL;
    }
    let scaled = (celsius * 100.0).round();
    scaled.clamp(f32::from(i16::MIN) + 1.0, f32::from(i16::MAX)) as i16
}

/// Scale hPa to tenths, keeping real readings off the sentinel.
fn hpa_to_fixed(hpa: f32) -> u16 {
    if !hpa.is_finite() || hpa <= 0.0 {
        return PRESSURE_SENTINEL;
    }
    (hpa * 10.0).round().clamp(1.0, f32::from(u16::MAX)) as u16
}

/// One calibrated measurement plus thermostat state, before placement in a
/// minute slot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Temperature in °C.
    pub temperature: f32,
    /// Relative humidity percentage, if measured.
    pub humidity: Option<u8>,
    /// Pressure in hPa, if measured.
    pub pressure: Option<f32>,
    /// Active setpoint in °C, if any.
    pub setpoint: Option<f32>,
    /// Heater relay state.
    pub relay_on: bool,
    /// Manual mode active.
    pub manual_mode: bool,
    /// Schedule exception active.
    pub exception_active: bool,
    /// Active program bank.
    pub active_bank: u8,
}

impl Reading {
    /// Convert to the fixed-point sample stored at `minute_of_day`.
    ///
    /// Humidity is capped at 100 so it cannot alias the sentinel.
    ///
    /// ```
    /// use tlog_types::{Reading, SampleFlags};
    ///
    /// let reading = Reading {
    ///     temperature: 20.5,
    ///     humidity: Some(55),
    ///     pressure: Some(1013.2),
    ///     setpoint: Some(21.0),
    ///     relay_on: true,
    ///     manual_mode: false,
    ///     exception_active: false,
    ///     active_bank: 0,
    /// };
    /// let sample = reading.to_sample(0);
    /// assert_eq!(sample.temperature, 2050);
    /// assert_eq!(sample.pressure, 10132);
    /// assert_eq!(sample.flags, SampleFlags::RELAY_ON);
    /// ```
    #[must_use]
    pub fn to_sample(&self, minute_of_day: u16) -> Sample {
        let mut flags = SampleFlags::empty();
        flags.set(SampleFlags::RELAY_ON, self.relay_on);
        flags.set(SampleFlags::MANUAL_MODE, self.manual_mode);
        flags.set(SampleFlags::EXCEPTION, self.exception_active);

        Sample {
            minute_of_day,
            temperature: celsius_to_fixed(self.temperature),
            humidity: self.humidity.map_or(HUMIDITY_SENTINEL, |h| h.min(100)),
            flags,
            setpoint: self.setpoint.map_or(SETPOINT_SENTINEL, celsius_to_fixed),
            active_bank: self.active_bank,
            reserved: 0,
            pressure: self.pressure.map_or(PRESSURE_SENTINEL, hpa_to_fixed),
        }
    }
}
