//! Per-minute sampling loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tlog_store::Rollover;

use crate::sensor::{SensorError, SensorSource, ThermostatSource, combine};
use crate::state::AppState;

/// What a single collection cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Minute of day the sample was stored at.
    pub minute: u16,
    pub rollover: Rollover,
    /// Whether a checkpoint save ran.
    pub checkpointed: bool,
}

/// Background collector: the single writer of the day buffer.
pub struct Collector {
    state: Arc<AppState>,
    sensor: Arc<dyn SensorSource>,
    thermostat: Arc<dyn ThermostatSource>,
    last_checkpoint: Instant,
}

impl Collector {
    pub fn new(
        state: Arc<AppState>,
        sensor: Arc<dyn SensorSource>,
        thermostat: Arc<dyn ThermostatSource>,
    ) -> Self {
        Self {
            state,
            sensor,
            thermostat,
            last_checkpoint: Instant::now(),
        }
    }

    /// Spawn the sampling loop. It runs until `cancel` fires, then flushes the
    /// buffer and releases it.
    pub fn start(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Sampling loop; see [`start`](Self::start).
    pub async fn run(mut self, cancel: CancellationToken) {
        let period = Duration::from_secs(self.state.config.sampling.interval_secs);
        info!("Starting collector (interval: {}s)", period.as_secs());

        let mut interval_timer = interval(period);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures = 0u32;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Collector cancelled");
                    break;
                }
                _ = interval_timer.tick() => {
                    match self.tick().await {
                        Ok(outcome) => {
                            consecutive_failures = 0;
                            debug!(
                                "Recorded minute {} ({})",
                                outcome.minute,
                                tlog_types::minute_label(outcome.minute)
                            );
                        }
                        Err(e) => {
                            consecutive_failures += 1;
                            self.state.counters.record_failure();
                            if consecutive_failures <= 3 {
                                warn!("Failed to record sample: {} (attempt {})", e, consecutive_failures);
                            } else if consecutive_failures == 4 {
                                error!(
                                    "Failed to record sample {} times in a row, will continue trying silently",
                                    consecutive_failures
                                );
                            }
                        }
                    }
                }
            }
        }

        let mut history = self.state.history.write().await;
        if let Err(e) = history.shutdown() {
            error!("History not flushed: {}", e);
        }
    }

    /// Read the sensors and record one sample; roll over, prune old days, and
    /// checkpoint as needed.
    pub async fn tick(&mut self) -> Result<TickOutcome, CollectorError> {
        let climate = self.sensor.read().await?;
        let status = self.thermostat.status().await;
        let reading = combine(climate, status);

        let config = &self.state.config;
        let mut history = self.state.history.write().await;

        let rollover = history.record(&reading)?;
        let minute = history.buffer().current_minute();
        self.state.counters.record_sample();

        if let Rollover::DayChanged {
            previous,
            current,
            saved,
        } = rollover
        {
            self.state.counters.record_rollover();
            info!(
                "Rolled over from {} to {} (previous day saved: {})",
                previous, current, saved
            );
            match history.dir().cleanup(current, config.storage.keep_days) {
                Ok(removed) if !removed.is_empty() => {
                    info!("Removed {} expired day file(s)", removed.len());
                }
                Ok(_) => {}
                Err(e) => warn!("Retention cleanup failed: {}", e),
            }
            self.last_checkpoint = Instant::now();
        }

        let mut checkpointed = false;
        let every = u64::from(config.sampling.checkpoint_minutes) * 60;
        if every > 0 && self.last_checkpoint.elapsed() >= Duration::from_secs(every) {
            checkpointed = history.save_if_dirty()?;
            self.last_checkpoint = Instant::now();
            if checkpointed {
                self.state.counters.record_checkpoint();
                debug!("Checkpoint saved");
            }
        }

        Ok(TickOutcome {
            minute,
            rollover,
            checkpointed,
        })
    }
}

/// Collector errors.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to read sensor: {0}")]
    Sensor(#[from] SensorError),
    #[error("Failed to store sample: {0}")]
    Store(#[from] tlog_store::Error),
}
