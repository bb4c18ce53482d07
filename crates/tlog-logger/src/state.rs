//! Application state shared between the collector and readers.
//!
//! The collector is the only task that takes the write lock. Readers take
//! the read lock just long enough to copy what they need, so they always see
//! whole records and never hold the lock across file I/O.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::task::JoinError;

use tlog_store::{Clock, DayBuffer, DayStats, HistoryManager, LogDir};
use tlog_types::{LogDate, Sample};

use crate::config::Config;

/// Clock handle shared by the history manager and anything else that needs
/// the local date.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Shared application state.
pub struct AppState {
    /// The day buffer and its files. Written only by the collector.
    pub history: RwLock<HistoryManager<SharedClock>>,
    /// Configuration in effect.
    pub config: Config,
    /// Collector counters.
    pub counters: CollectorCounters,
}

impl AppState {
    pub fn new(history: HistoryManager<SharedClock>, config: Config) -> Arc<Self> {
        Arc::new(Self {
            history: RwLock::new(history),
            config,
            counters: CollectorCounters::default(),
        })
    }

    /// Copy of the live day buffer.
    pub async fn snapshot(&self) -> DayBuffer {
        self.history.read().await.snapshot()
    }

    /// Copy of one minute of the live buffer.
    pub async fn sample(&self, minute: u16) -> tlog_store::Result<Sample> {
        self.history.read().await.get(minute)
    }

    pub async fn stats(&self) -> DayStats {
        self.history.read().await.stats()
    }

    /// A day's buffer for inspection.
    ///
    /// Today comes from memory; other days are read from disk on the
    /// blocking pool without holding the lock.
    pub async fn load_day(&self, date: LogDate) -> tlog_store::Result<DayBuffer> {
        let dir: LogDir = {
            let history = self.history.read().await;
            if history.buffer().is_initialized() && history.buffer().date() == date {
                return Ok(history.snapshot());
            }
            history.dir().clone()
        };
        tokio::task::spawn_blocking(move || dir.load(date))
            .await
            .map_err(task_failed)?
    }
}

fn task_failed(e: JoinError) -> tlog_store::Error {
    tlog_store::Error::Task(e.to_string())
}

/// Counters updated by the collector.
#[derive(Debug, Default)]
pub struct CollectorCounters {
    samples: AtomicU64,
    failures: AtomicU64,
    checkpoints: AtomicU64,
    rollovers: AtomicU64,
}

impl CollectorCounters {
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn checkpoints(&self) -> u64 {
        self.checkpoints.load(Ordering::Relaxed)
    }

    pub fn rollovers(&self) -> u64 {
        self.rollovers.load(Ordering::Relaxed)
    }

    pub(crate) fn record_sample(&self) {
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_checkpoint(&self) {
        self.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollover(&self) {
        self.rollovers.fetch_add(1, Ordering::Relaxed);
    }
}
