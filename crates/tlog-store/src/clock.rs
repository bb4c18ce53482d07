//! Wall-clock source consumed by the rollover controller.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tlog_types::LogDate;

/// Supplies the current calendar date and minute of day.
///
/// Implementations own their time-zone and synchronization policy; the
/// history layer only compares what they return.
pub trait Clock {
    fn current_date(&self) -> LogDate;

    /// Minute of the current day, 0-1439.
    fn current_minute_of_day(&self) -> u16;

    /// Date and minute of day taken from a single reading of the clock.
    ///
    /// Callers that need both must use this so the pair cannot straddle
    /// midnight.
    fn now(&self) -> (LogDate, u16) {
        (self.current_date(), self.current_minute_of_day())
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn current_date(&self) -> LogDate {
        (**self).current_date()
    }

    fn current_minute_of_day(&self) -> u16 {
        (**self).current_minute_of_day()
    }

    fn now(&self) -> (LogDate, u16) {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn current_date(&self) -> LogDate {
        (**self).current_date()
    }

    fn current_minute_of_day(&self) -> u16 {
        (**self).current_minute_of_day()
    }

    fn now(&self) -> (LogDate, u16) {
        (**self).now()
    }
}

/// Clock that only moves when told to.
///
/// Useful for tests and for replaying data with synthetic timestamps.
///
/// ```
/// use tlog_store::{Clock, ManualClock};
/// use tlog_types::LogDate;
///
/// let clock = ManualClock::new(LogDate::new(2025, 12, 21).unwrap(), 600);
/// clock.set_minute(601);
/// assert_eq!(clock.current_minute_of_day(), 601);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    date: Mutex<LogDate>,
    minute: AtomicU16,
}

impl ManualClock {
    pub fn new(date: LogDate, minute_of_day: u16) -> Self {
        Self {
            date: Mutex::new(date),
            minute: AtomicU16::new(minute_of_day),
        }
    }

    pub fn set_date(&self, date: LogDate) {
        *self.date.lock().unwrap_or_else(PoisonError::into_inner) = date;
    }

    pub fn set_minute(&self, minute_of_day: u16) {
        self.minute.store(minute_of_day, Ordering::Relaxed);
    }

    /// Move to `date` at `minute_of_day` in one call.
    pub fn set(&self, date: LogDate, minute_of_day: u16) {
        self.set_date(date);
        self.set_minute(minute_of_day);
    }
}

impl Clock for ManualClock {
    fn current_date(&self) -> LogDate {
        *self.date.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_minute_of_day(&self) -> u16 {
        self.minute.load(Ordering::Relaxed)
    }

    fn now(&self) -> (LogDate, u16) {
        let date = self.date.lock().unwrap_or_else(PoisonError::into_inner);
        (*date, self.minute.load(Ordering::Relaxed))
    }
}
