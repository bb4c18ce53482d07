//! Sampling daemon for the daily thermostat history.
//!
//! This crate provides a service that:
//! - Samples a sensor and thermostat once per configured interval
//! - Records each sample into today's history buffer
//! - Rolls over to a new day file at midnight and prunes old days
//! - Checkpoints the live buffer periodically and flushes it on shutdown
//!
//! # Configuration
//!
//! The logger reads configuration from `~/.config/tlog/logger.toml`:
//!
//! ```toml
//! [storage]
//! dir = "/var/lib/tlog"
//! keep_days = 30
//!
//! [sampling]
//! interval_secs = 60
//! checkpoint_minutes = 10
//!
//! [clock]
//! utc_offset_minutes = 60
//! ```

pub mod clock;
pub mod collector;
pub mod config;
pub mod sensor;
pub mod simulator;
pub mod state;

pub use clock::SystemClock;
pub use collector::{Collector, CollectorError, TickOutcome};
pub use config::{
    ClockConfig, Config, ConfigError, SamplingConfig, SimulatorConfig, StorageConfig,
    ValidationError,
};
pub use sensor::{ClimateReading, SensorError, SensorSource, ThermostatSource, ThermostatStatus};
pub use simulator::Simulator;
pub use state::{AppState, CollectorCounters, SharedClock};
