//! System wall clock at a fixed UTC offset.

use time::{OffsetDateTime, UtcOffset};
use tlog_store::Clock;
use tlog_types::LogDate;

/// Reads the system time and shifts it by a configured offset.
///
/// The offset is fixed at construction; daylight-saving changes are picked
/// up by restarting with a new configuration.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// Clock at `utc_offset_minutes` from UTC.
    pub fn new(utc_offset_minutes: i16) -> Result<Self, time::error::ComponentRange> {
        let offset = UtcOffset::from_whole_seconds(i32::from(utc_offset_minutes) * 60)?;
        Ok(Self { offset })
    }

    pub fn utc() -> Self {
        Self {
            offset: UtcOffset::UTC,
        }
    }

    /// Current local date and time.
    pub fn local_now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Date and minute of day of a local timestamp.
pub fn split(now: OffsetDateTime) -> (LogDate, u16) {
    let date = now.date();
    let log_date = LogDate {
        year: date.year().clamp(0, i32::from(u16::MAX)) as u16,
        month: u8::from(date.month()),
        day: date.day(),
    };
    let minute = u16::from(now.hour()) * 60 + u16::from(now.minute());
    (log_date, minute)
}

impl Clock for SystemClock {
    fn current_date(&self) -> LogDate {
        split(self.local_now()).0
    }

    fn current_minute_of_day(&self) -> u16 {
        split(self.local_now()).1
    }

    fn now(&self) -> (LogDate, u16) {
        split(self.local_now())
    }
}
