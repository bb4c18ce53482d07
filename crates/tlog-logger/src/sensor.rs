//! Collaborator seams for the sampling loop.
//!
//! The collector only needs calibrated climate values and the thermostat's
//! current state; [`SensorSource`] and [`ThermostatSource`] abstract over
//! real hardware drivers and the built-in simulator.

use async_trait::async_trait;

use tlog_types::Reading;

/// Calibrated climate values from one sensor read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    /// Temperature in °C.
    pub temperature: f32,
    /// Relative humidity in %.
    pub humidity: u8,
    /// Pressure in hPa.
    pub pressure: f32,
}

/// Thermostat state at the moment of sampling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThermostatStatus {
    /// Active setpoint in °C, if the thermostat has one.
    pub setpoint: Option<f32>,
    pub relay_on: bool,
    pub manual_mode: bool,
    pub exception_active: bool,
    pub active_bank: u8,
}

/// Errors from a sensor read.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The sensor answered but flagged the values as invalid.
    #[error("Sensor reported invalid data")]
    Invalid,
    /// The sensor could not be reached.
    #[error("Sensor unavailable: {0}")]
    Unavailable(String),
}

/// Source of calibrated climate readings.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Take one reading.
    async fn read(&self) -> Result<ClimateReading, SensorError>;
}

/// Source of thermostat state.
#[async_trait]
pub trait ThermostatSource: Send + Sync {
    async fn status(&self) -> ThermostatStatus;
}

/// Merge a climate reading and thermostat state into one history reading.
pub fn combine(climate: ClimateReading, status: ThermostatStatus) -> Reading {
    Reading {
        temperature: climate.temperature,
        humidity: Some(climate.humidity),
        pressure: Some(climate.pressure),
        setpoint: status.setpoint,
        relay_on: status.relay_on,
        manual_mode: status.manual_mode,
        exception_active: status.exception_active,
        active_bank: status.active_bank,
    }
}
