//! Day-boundary detection, startup reconciliation, and the history manager
//! that ties the buffer, the day files, and the clock together.

use tracing::{debug, error, info, warn};

use tlog_types::{LogDate, Reading, SAMPLES_PER_DAY, Sample};

use crate::buffer::{DayBuffer, DayStats};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::files::{LoadReport, LogDir};

/// Result of a day-change check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    /// The buffer already represents the clock's current date.
    SameDay,
    /// The buffer was re-initialized for a new date.
    DayChanged {
        previous: LogDate,
        current: LogDate,
        /// Whether the outgoing day was written to disk.
        saved: bool,
    },
}

impl Rollover {
    pub fn is_day_changed(&self) -> bool {
        matches!(self, Self::DayChanged { .. })
    }
}

/// What startup reconciliation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Slots after "now" that held data and were reset.
    pub invalidated: usize,
    /// Recomputed high-water mark.
    pub num_samples: u16,
    /// Recomputed last-written minute.
    pub current_minute: u16,
}

/// Bring a freshly loaded buffer in line with the wall clock.
///
/// Every slot after `now_minute` is reset to its sentinel form. The
/// high-water mark becomes one past the latest valid slot at or before
/// `now_minute` (0 if none) and `current_minute` that slot (0 if none). The
/// buffer is marked dirty if any slot changed.
pub fn reconcile(buffer: &mut DayBuffer, now_minute: u16) -> Reconciliation {
    let now = usize::from(now_minute).min(SAMPLES_PER_DAY - 1);

    let mut invalidated = 0;
    for (i, slot) in buffer.samples.iter_mut().enumerate().skip(now + 1) {
        let empty = Sample::empty(i as u16);
        if *slot != empty {
            *slot = empty;
            invalidated += 1;
        }
    }

    let latest = buffer
        .samples
        .iter()
        .take(now + 1)
        .rposition(Sample::is_valid)
        .map(|i| i as u16);

    buffer.header.num_samples = latest.map_or(0, |m| m + 1);
    buffer.current_minute = latest.unwrap_or(0);
    if invalidated > 0 {
        buffer.dirty = true;
    }

    Reconciliation {
        invalidated,
        num_samples: buffer.header.num_samples,
        current_minute: buffer.current_minute,
    }
}

/// How [`HistoryManager::init`] obtained today's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Today's file was loaded and reconciled.
    Resumed {
        report: LoadReport,
        reconciliation: Reconciliation,
    },
    /// No usable file; logging starts from an empty day.
    Fresh,
}

/// Owner of the single day buffer.
///
/// All writes go through one `HistoryManager`; readers get copies.
#[derive(Debug)]
pub struct HistoryManager<C> {
    dir: LogDir,
    clock: C,
    buffer: DayBuffer,
}

impl<C: Clock> HistoryManager<C> {
    /// Create a manager with an unallocated buffer. Call [`init`](Self::init)
    /// before recording.
    pub fn new(dir: LogDir, clock: C) -> Self {
        Self {
            dir,
            clock,
            buffer: DayBuffer::new(),
        }
    }

    /// Allocate the buffer and resume today's file if there is one.
    ///
    /// A missing or unreadable file is not an error; the day starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the buffer cannot be allocated.
    pub fn init(&mut self) -> Result<Startup> {
        let (today, now) = self.clock.now();
        self.buffer.init_for_date(today)?;

        match self.dir.load_into(today, &mut self.buffer) {
            Ok(report) => {
                if self.buffer.date() != today {
                    warn!(
                        "Log for {} carries header date {}, restamping",
                        today,
                        self.buffer.date()
                    );
                    self.buffer.restamp(today);
                }
                let reconciliation = reconcile(&mut self.buffer, now);
                if reconciliation.invalidated > 0 {
                    warn!(
                        "Discarded {} samples after {} in today's log",
                        reconciliation.invalidated,
                        tlog_types::minute_label(now)
                    );
                }
                info!(
                    "Resumed history for {} ({} samples high-water)",
                    today, reconciliation.num_samples
                );
                Ok(Startup::Resumed {
                    report,
                    reconciliation,
                })
            }
            Err(e) => {
                if e.is_not_found() {
                    debug!("No history for {} yet, starting empty", today);
                } else {
                    warn!("Ignoring unreadable history for {}: {}", today, e);
                }
                self.buffer.init_for_date(today)?;
                info!("Started new history for {}", today);
                Ok(Startup::Fresh)
            }
        }
    }

    /// Roll the buffer over if the clock has moved to another date.
    ///
    /// The outgoing day is saved first when it has unsaved samples. A failed
    /// save is logged and the new day starts regardless.
    pub fn check_day_change(&mut self) -> Result<Rollover> {
        let current = self.clock.current_date();
        self.roll_to(current)
    }

    fn roll_to(&mut self, current: LogDate) -> Result<Rollover> {
        if !self.buffer.is_initialized() {
            return Err(Error::NotInitialized);
        }

        let previous = self.buffer.date();
        if previous == current {
            return Ok(Rollover::SameDay);
        }

        info!("Day changed from {} to {}", previous, current);
        let mut saved = false;
        if self.buffer.is_dirty() && self.buffer.num_samples() > 0 {
            match self.dir.save(&mut self.buffer) {
                Ok(()) => saved = true,
                Err(e) => error!("Failed to save history for {}: {}", previous, e),
            }
        }

        self.buffer.init_for_date(current)?;
        Ok(Rollover::DayChanged {
            previous,
            current,
            saved,
        })
    }

    /// Check for a day change, then store `reading` at the clock's current
    /// minute. Date and minute come from one clock reading.
    pub fn record(&mut self, reading: &Reading) -> Result<Rollover> {
        let (today, minute) = self.clock.now();
        let rollover = self.roll_to(today)?;
        self.buffer.insert(reading.to_sample(minute))?;
        Ok(rollover)
    }

    /// Insert a pre-built sample without consulting the clock.
    pub fn add_sample(&mut self, sample: Sample) -> Result<()> {
        self.buffer.insert(sample)
    }

    /// Write the buffer to its day file.
    pub fn save(&mut self) -> Result<()> {
        self.dir.save(&mut self.buffer)
    }

    /// Save only if there are unsaved changes. Returns whether a save ran.
    pub fn save_if_dirty(&mut self) -> Result<bool> {
        if !self.buffer.is_initialized() || !self.buffer.is_dirty() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Flush unsaved changes and free the buffer.
    ///
    /// The buffer is released even when the flush fails.
    pub fn shutdown(&mut self) -> Result<()> {
        let flushed = self.save_if_dirty();
        self.buffer.release();
        match &flushed {
            Ok(true) => info!("History flushed on shutdown"),
            Ok(false) => debug!("History clean on shutdown"),
            Err(e) => error!("Failed to flush history on shutdown: {}", e),
        }
        flushed.map(|_| ())
    }

    /// Copy of the sample at `minute` in the live buffer.
    pub fn get(&self, minute: u16) -> Result<Sample> {
        self.buffer.get(minute)
    }

    pub fn stats(&self) -> DayStats {
        self.buffer.stats()
    }

    /// Copy of the live buffer.
    pub fn snapshot(&self) -> DayBuffer {
        self.buffer.clone()
    }

    /// A day's buffer for inspection: a copy of the live buffer for its own
    /// date, otherwise loaded from disk.
    pub fn load_day(&self, date: LogDate) -> Result<DayBuffer> {
        if self.buffer.is_initialized() && self.buffer.date() == date {
            return Ok(self.snapshot());
        }
        self.dir.load(date)
    }

    pub fn exists(&self, date: LogDate) -> bool {
        self.dir.exists(date)
    }

    pub fn filename_for(&self, date: LogDate) -> String {
        LogDir::filename_for(date)
    }

    pub fn buffer(&self) -> &DayBuffer {
        &self.buffer
    }

    pub fn dir(&self) -> &LogDir {
        &self.dir
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::clock::ManualClock;

    fn day(d: u8) -> LogDate {
        LogDate::new(2025, 12, d).unwrap()
    }

    fn reading(temperature: f32) -> Reading {
        Reading {
            temperature,
            humidity: Some(50),
            pressure: Some(1013.0),
            setpoint: Some(20.0),
            relay_on: true,
            manual_mode: false,
            exception_active: false,
            active_bank: 0,
        }
    }

    fn manager(tmp: &TempDir, clock: &Arc<ManualClock>) -> HistoryManager<Arc<ManualClock>> {
        HistoryManager::new(LogDir::new(tmp.path()), Arc::clone(clock))
    }

    #[test]
    fn test_reconcile_without_future_data_keeps_clean() {
        let mut buffer = DayBuffer::for_date(day(1)).unwrap();
        buffer.insert(Sample::builder(10).temperature_raw(2000).build()).unwrap();
        buffer.dirty = false;

        let r = reconcile(&mut buffer, 100);

        assert_eq!(r.invalidated, 0);
        assert_eq!(r.num_samples, 11);
        assert_eq!(r.current_minute, 10);
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn test_reconcile_resets_partial_future_slot() {
        let mut buffer = DayBuffer::for_date(day(1)).unwrap();
        // Invalid temperature but stray humidity still counts as a change.
        buffer.insert(Sample::builder(50).humidity(40).build()).unwrap();
        buffer.dirty = false;

        let r = reconcile(&mut buffer, 20);

        assert_eq!(r.invalidated, 1);
        assert_eq!(r.num_samples, 0);
        assert_eq!(r.current_minute, 0);
        assert_eq!(buffer.samples()[50], Sample::empty(50));
        assert!(buffer.is_dirty());
    }

    #[test]
    fn test_init_without_file_starts_fresh() {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 30));
        let mut history = manager(&tmp, &clock);

        assert_eq!(history.init().unwrap(), Startup::Fresh);
        assert!(history.buffer().is_initialized());
        assert_eq!(history.buffer().date(), day(21));
    }

    #[test]
    fn test_init_with_corrupt_file_starts_fresh() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("log_20251221.bin"), b"XXXXgarbage!").unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 30));
        let mut history = manager(&tmp, &clock);

        assert_eq!(history.init().unwrap(), Startup::Fresh);
        assert_eq!(history.buffer().num_samples(), 0);
    }

    #[test]
    fn test_record_uses_clock_minute() {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 75));
        let mut history = manager(&tmp, &clock);
        history.init().unwrap();

        let rollover = history.record(&reading(20.5)).unwrap();

        assert_eq!(rollover, Rollover::SameDay);
        let sample = history.get(75).unwrap();
        assert_eq!(sample.temperature, 2050);
        assert_eq!(sample.setpoint, 2000);
        assert!(sample.relay_on());
    }

    #[test]
    fn test_check_day_change_before_init() {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 0));
        let mut history = manager(&tmp, &clock);
        assert!(matches!(
            history.check_day_change(),
            Err(Error::NotInitialized)
        ));
    }

    #[test]
    fn test_day_change_without_samples_skips_save() {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 1439));
        let mut history = manager(&tmp, &clock);
        history.init().unwrap();

        clock.set(day(22), 0);
        let rollover = history.check_day_change().unwrap();

        assert_eq!(
            rollover,
            Rollover::DayChanged {
                previous: day(21),
                current: day(22),
                saved: false
            }
        );
        assert!(!history.exists(day(21)));
    }

    #[test]
    fn test_day_change_save_failure_still_rolls_over() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("logs");
        std::fs::create_dir(&root).unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 10));
        let mut history = HistoryManager::new(LogDir::new(&root), Arc::clone(&clock));
        history.init().unwrap();
        history.record(&reading(19.0)).unwrap();

        std::fs::remove_dir(&root).unwrap();
        clock.set(day(22), 0);
        let rollover = history.check_day_change().unwrap();

        assert!(matches!(rollover, Rollover::DayChanged { saved: false, .. }));
        assert_eq!(history.buffer().date(), day(22));
        assert!(!history.buffer().is_dirty());
    }

    #[test]
    fn test_shutdown_flushes_and_releases() {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 5));
        let mut history = manager(&tmp, &clock);
        history.init().unwrap();
        history.record(&reading(21.0)).unwrap();

        history.shutdown().unwrap();

        assert!(!history.buffer().is_initialized());
        assert!(history.exists(day(21)));
        let on_disk = history.dir().read_sample(day(21), 5).unwrap();
        assert_eq!(on_disk.temperature, 2100);
    }

    #[test]
    fn test_save_if_dirty() {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 5));
        let mut history = manager(&tmp, &clock);
        history.init().unwrap();

        assert!(!history.save_if_dirty().unwrap());
        history.record(&reading(21.0)).unwrap();
        assert!(history.save_if_dirty().unwrap());
        assert!(!history.save_if_dirty().unwrap());
    }

    #[test]
    fn test_load_day_prefers_live_buffer() {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(day(21), 5));
        let mut history = manager(&tmp, &clock);
        history.init().unwrap();
        history.record(&reading(21.0)).unwrap();

        let live = history.load_day(day(21)).unwrap();
        assert_eq!(live.get(5).unwrap().temperature, 2100);
        assert!(history.load_day(day(20)).unwrap_err().is_not_found());
        assert_eq!(history.filename_for(day(20)), "log_20251220.bin");
    }

    /// Clock that jumps to a queued instant right after it is read, so two
    /// consecutive reads can straddle midnight.
    struct SteppingClock {
        inner: ManualClock,
        next: std::sync::Mutex<Option<(LogDate, u16)>>,
    }

    impl SteppingClock {
        fn new(date: LogDate, minute: u16) -> Self {
            Self {
                inner: ManualClock::new(date, minute),
                next: std::sync::Mutex::new(None),
            }
        }

        fn step_after_next_read(&self, date: LogDate, minute: u16) {
            *self.next.lock().unwrap() = Some((date, minute));
        }

        fn step(&self) {
            if let Some((date, minute)) = self.next.lock().unwrap().take() {
                self.inner.set(date, minute);
            }
        }
    }

    impl Clock for SteppingClock {
        fn current_date(&self) -> LogDate {
            let date = self.inner.current_date();
            self.step();
            date
        }

        fn current_minute_of_day(&self) -> u16 {
            let minute = self.inner.current_minute_of_day();
            self.step();
            minute
        }

        fn now(&self) -> (LogDate, u16) {
            let now = self.inner.now();
            self.step();
            now
        }
    }

    #[test]
    fn test_record_at_midnight_keeps_previous_day_intact() {
        let tmp = TempDir::new().unwrap();
        let clock = Arc::new(SteppingClock::new(day(21), 1439));
        let mut history = HistoryManager::new(LogDir::new(tmp.path()), Arc::clone(&clock));
        history.init().unwrap();
        history
            .add_sample(Sample::builder(0).temperature_raw(1500).build())
            .unwrap();
        history.save().unwrap();

        clock.step_after_next_read(day(22), 0);
        let rollover = history.record(&reading(30.0)).unwrap();
        assert_eq!(rollover, Rollover::SameDay);
        history.save().unwrap();

        let dir = history.dir();
        assert_eq!(dir.read_sample(day(21), 0).unwrap().temperature, 1500);
        assert_eq!(dir.read_sample(day(21), 1439).unwrap().temperature, 3000);

        let rollover = history.record(&reading(16.0)).unwrap();
        assert!(rollover.is_day_changed());
        assert_eq!(history.get(0).unwrap().temperature, 1600);
        assert_eq!(dir_sample(&history, day(21), 0), 1500);
    }

    fn dir_sample<C: Clock>(history: &HistoryManager<C>, date: LogDate, minute: u16) -> i16 {
        history.dir().read_sample(date, minute).unwrap().temperature
    }

    #[test]
    fn test_init_restamps_mismatched_header_date() {
        let tmp = TempDir::new().unwrap();
        let dir = LogDir::new(tmp.path());

        let mut yesterday = DayBuffer::for_date(day(20)).unwrap();
        yesterday
            .insert(Sample::builder(5).temperature_raw(1111).build())
            .unwrap();
        dir.save(&mut yesterday).unwrap();

        // Today's file, but its header claims the 20th.
        let mut misdated = DayBuffer::for_date(day(20)).unwrap();
        misdated
            .insert(Sample::builder(100).temperature_raw(2222).build())
            .unwrap();
        let image = crate::files::encode_file(&misdated);
        std::fs::write(dir.path_for(day(21)), image).unwrap();

        let clock = Arc::new(ManualClock::new(day(21), 200));
        let mut history = manager(&tmp, &clock);
        assert!(matches!(history.init().unwrap(), Startup::Resumed { .. }));
        assert_eq!(history.buffer().date(), day(21));
        assert!(history.buffer().is_dirty());

        assert_eq!(history.record(&reading(19.0)).unwrap(), Rollover::SameDay);
        history.save().unwrap();

        assert_eq!(dir_sample(&history, day(21), 100), 2222);
        assert_eq!(dir_sample(&history, day(21), 200), 1900);
        assert_eq!(dir_sample(&history, day(20), 5), 1111);
        assert!(history.dir().read_sample(day(20), 100).unwrap_err().is_not_found());
        let reloaded = history.dir().load(day(21)).unwrap();
        assert_eq!(reloaded.date(), day(21));
    }
}
