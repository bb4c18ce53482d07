//! Binary types for daily thermostat log files.
//!
//! This crate defines the on-disk layout shared by the logger and the
//! command-line tools: a 12-byte `TLOG` header followed by 1440 fixed-size
//! sample records, one per minute of the day.
//!
//! # Features
//!
//! - [`Sample`] and [`LogHeader`] codecs (little-endian, fixed layout)
//! - [`LogDate`] with deterministic `log_YYYYMMDD.bin` file naming
//! - [`Reading`] to convert calibrated floats into fixed-point samples
//! - Error types for slice decoding and date parsing
//!
//! # Example
//!
//! ```
//! use tlog_types::{LogDate, Sample};
//!
//! let date: LogDate = "2025-12-21".parse().unwrap();
//! assert_eq!(date.filename(), "log_20251221.bin");
//!
//! let sample = Sample::builder(754).temperature_raw(2050).humidity(55).build();
//! assert_eq!(Sample::from_bytes(&sample.to_bytes()), sample);
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    FILE_PREFIX, FILE_SIZE, FILE_SUFFIX, FORMAT_VERSION, HEADER_SIZE, HUMIDITY_SENTINEL, LogDate,
    LogHeader, MAGIC, PRESSURE_SENTINEL, Reading, SAMPLE_SIZE, SAMPLES_PER_DAY, SETPOINT_SENTINEL,
    Sample, SampleBuilder, SampleFlags, TEMPERATURE_SENTINEL, minute_label, record_offset,
};

#[cfg(test)]
mod tests {
    use super::*;

    // --- Sample codec tests ---

    #[test]
    fn test_sample_to_bytes_layout() {
        let sample = Sample::builder(754)
            .temperature_raw(2050)
            .humidity(55)
            .flags(SampleFlags::RELAY_ON | SampleFlags::EXCEPTION)
            .setpoint_raw(2100)
            .active_bank(2)
            .pressure_raw(10132)
            .build();

        let bytes = sample.to_bytes();

        assert_eq!(
            bytes,
            [
                0xF2, 0x02, // minute = 754
                0x02, 0x08, // temperature = 2050
                55,   // humidity
                0x05, // flags = relay | exception
                0x34, 0x08, // setpoint = 2100
                2,    // bank
                0,    // reserved
                0x94, 0x27, // pressure = 10132
            ]
        );
    }

    #[test]
    fn test_sample_from_bytes_negative_temperature() {
        // -5.25°C = -525 = 0xFDF3
        let bytes: [u8; 12] = [0x00, 0x00, 0xF3, 0xFD, 40, 0, 0x00, 0x80, 0, 0, 0, 0];

        let sample = Sample::from_bytes(&bytes);

        assert_eq!(sample.temperature, -525);
        assert_eq!(sample.temperature_celsius(), Some(-5.25));
        assert_eq!(sample.setpoint_celsius(), None);
        assert_eq!(sample.pressure_hpa(), None);
        assert!(sample.is_valid());
    }

    #[test]
    fn test_sample_decode_insufficient_bytes() {
        let result = Sample::decode(&[0u8; 7]);

        assert_eq!(
            result,
            Err(ParseError::InsufficientBytes {
                expected: 12,
                actual: 7
            })
        );
    }

    #[test]
    fn test_sample_decode_ignores_trailing_bytes() {
        let sample = Sample::builder(3).temperature_raw(1800).build();
        let mut data = sample.to_bytes().to_vec();
        data.extend_from_slice(&[0xAA; 5]);

        assert_eq!(Sample::decode(&data).unwrap(), sample);
    }

    #[test]
    fn test_sample_reserved_and_unknown_flags_preserved() {
        let bytes: [u8; 12] = [1, 0, 0, 0, 50, 0xF9, 0, 0, 3, 0x7E, 1, 0];

        let sample = Sample::from_bytes(&bytes);

        assert_eq!(sample.flags.bits(), 0xF9);
        assert_eq!(sample.reserved, 0x7E);
        assert!(sample.relay_on());
        assert!(!sample.manual_mode());
        assert_eq!(sample.to_bytes(), bytes);
    }

    // --- Sentinel tests ---

    #[test]
    fn test_empty_sample_is_invalid() {
        let sample = Sample::empty(100);

        assert!(!sample.is_valid());
        assert_eq!(sample.minute_of_day, 100);
        assert_eq!(sample.temperature, TEMPERATURE_SENTINEL);
        assert_eq!(sample.humidity, HUMIDITY_SENTINEL);
        assert_eq!(sample.setpoint, SETPOINT_SENTINEL);
        assert_eq!(sample.pressure, PRESSURE_SENTINEL);
        assert_eq!(sample.humidity_percent(), None);
    }

    #[test]
    fn test_validity_depends_only_on_temperature() {
        let sample = Sample::builder(0).temperature_raw(0).build();
        assert!(sample.is_valid());

        let sample = Sample::builder(0).humidity(40).pressure_raw(10000).build();
        assert!(!sample.is_valid());
    }

    // --- Header tests ---

    #[test]
    fn test_header_layout() {
        let mut header = LogHeader::new(LogDate::new(2025, 12, 21).unwrap());
        header.num_samples = 600;

        assert_eq!(
            header.to_bytes(),
            [b'T', b'L', b'O', b'G', 1, 0xE9, 0x07, 12, 21, 0x58, 0x02, 0]
        );
    }

    #[test]
    fn test_header_bad_magic_detected() {
        let header = LogHeader::from_bytes(b"XXXX\x01\xE9\x07\x0C\x15\x00\x00\x00");

        assert!(!header.has_valid_magic());
        assert!(header.is_current_version());
        assert_eq!(header.date().to_string(), "2025-12-21");
    }

    #[test]
    fn test_header_decode_short_slice() {
        let result = LogHeader::decode(b"TLOG");
        assert!(matches!(
            result,
            Err(ParseError::InsufficientBytes {
                expected: 12,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_file_size_constant() {
        assert_eq!(FILE_SIZE, 17_292);
        assert_eq!(record_offset(1), 24);
    }

    // --- Date tests ---

    #[test]
    fn test_date_parse_both_forms() {
        let a: LogDate = "20240229".parse().unwrap();
        let b: LogDate = "2024-02-29".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.compact(), "20240229");
    }

    #[test]
    fn test_date_rejects_invalid() {
        assert!("20230229".parse::<LogDate>().is_err());
        assert!("2023-13-01".parse::<LogDate>().is_err());
        assert!("2023121".parse::<LogDate>().is_err());
        assert!(LogDate::new(2025, 4, 31).is_err());
    }

    #[test]
    fn test_date_ordering_is_chronological() {
        let mut dates = vec![
            LogDate::new(2025, 1, 2).unwrap(),
            LogDate::new(2024, 12, 31).unwrap(),
            LogDate::new(2025, 1, 1).unwrap(),
        ];
        dates.sort();
        let shown: Vec<String> = dates.iter().map(ToString::to_string).collect();
        assert_eq!(shown, ["2024-12-31", "2025-01-01", "2025-01-02"]);
    }

    #[test]
    fn test_date_checked_sub_days_crosses_year() {
        let date = LogDate::new(2025, 1, 1).unwrap();
        assert_eq!(
            date.checked_sub_days(1),
            Some(LogDate::new(2024, 12, 31).unwrap())
        );
    }

    #[test]
    fn test_filename_round_trip() {
        let date = LogDate::new(2025, 3, 7).unwrap();
        assert_eq!(date.filename(), "log_20250307.bin");
        assert_eq!(LogDate::from_filename(&date.filename()), Some(date));
        assert_eq!(LogDate::from_filename("log_2025037.bin"), None);
        assert_eq!(LogDate::from_filename("LOG_20250307.bin"), None);
    }

    // --- Reading conversion tests ---

    fn reading(temperature: f32) -> Reading {
        Reading {
            temperature,
            humidity: Some(48),
            pressure: Some(1009.96),
            setpoint: None,
            relay_on: false,
            manual_mode: true,
            exception_active: false,
            active_bank: 1,
        }
    }

    #[test]
    fn test_reading_rounds_to_nearest() {
        let sample = reading(19.996).to_sample(10);

        assert_eq!(sample.minute_of_day, 10);
        assert_eq!(sample.temperature, 2000);
        assert_eq!(sample.pressure, 10100);
        assert_eq!(sample.setpoint, SETPOINT_SENTINEL);
        assert!(sample.manual_mode());
        assert!(!sample.relay_on());
        assert_eq!(sample.active_bank, 1);
    }

    #[test]
    fn test_reading_clamps_away_from_sentinel() {
        let sample = reading(-400.0).to_sample(0);
        assert_eq!(sample.temperature, i16::MIN + 1);
        assert!(sample.is_valid());

        let mut r = reading(20.0);
        r.humidity = Some(255);
        assert_eq!(r.to_sample(0).humidity, 100);
    }

    #[test]
    fn test_reading_nan_is_no_reading() {
        let sample = reading(f32::NAN).to_sample(0);
        assert!(!sample.is_valid());
    }

    #[test]
    fn test_minute_label() {
        assert_eq!(minute_label(0), "00:00");
        assert_eq!(minute_label(1439), "23:59");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_sample_serde_flags_transparent() {
        let sample = Sample::builder(1)
            .temperature_raw(2000)
            .flags(SampleFlags::RELAY_ON)
            .build();
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["flags"], 1);
        let back: Sample = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample);
    }
}
