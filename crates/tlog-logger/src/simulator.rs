//! Simulated sensor and hysteresis thermostat.
//!
//! The simulation advances in one-second steps:
//! - temperature rises 0.01 °C/s while the heater is on and falls 0.01 °C/s
//!   while it is off, clamped to 5-35 °C
//! - the heater turns on below the setpoint and off at setpoint + hysteresis
//! - humidity sweeps 40-60 % and pressure 980-1020 hPa, 0.05 per second

use std::sync::Mutex;
use std::sync::PoisonError;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::SimulatorConfig;
use crate::sensor::{ClimateReading, SensorError, SensorSource, ThermostatSource, ThermostatStatus};

const TEMP_STEP: i32 = 1;
const TEMP_MIN: i32 = 500;
const TEMP_MAX: i32 = 3500;
const HUMIDITY_STEP: i32 = 5;
const HUMIDITY_MIN: i32 = 4000;
const HUMIDITY_MAX: i32 = 6000;
const PRESSURE_STEP: i32 = 5;
const PRESSURE_MIN: i32 = 98_000;
const PRESSURE_MAX: i32 = 102_000;

/// Simulation state, all values in hundredths.
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    pub temperature: i32,
    pub humidity: i32,
    pub pressure: i32,
    humidity_rising: bool,
    pressure_rising: bool,
    pub heater_on: bool,
    pub setpoint: f32,
    pub hysteresis: f32,
}

impl SimState {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            temperature: ((config.initial_temperature * 100.0) as i32).clamp(TEMP_MIN, TEMP_MAX),
            humidity: i32::from(config.initial_humidity) * 100,
            pressure: i32::from(config.initial_pressure) * 100,
            humidity_rising: true,
            pressure_rising: true,
            heater_on: false,
            setpoint: config.setpoint,
            hysteresis: config.hysteresis,
        }
    }

    /// Advance the simulation by one second.
    pub fn step(&mut self) {
        if self.heater_on {
            self.temperature += TEMP_STEP;
        } else {
            self.temperature -= TEMP_STEP;
        }
        self.temperature = self.temperature.clamp(TEMP_MIN, TEMP_MAX);

        let celsius = self.temperature as f32 / 100.0;
        if self.heater_on {
            if celsius >= self.setpoint + self.hysteresis {
                self.heater_on = false;
                debug!("Simulated heater OFF at {:.2}°C", celsius);
            }
        } else if celsius < self.setpoint {
            self.heater_on = true;
            debug!("Simulated heater ON at {:.2}°C", celsius);
        }

        (self.humidity, self.humidity_rising) = sweep(
            self.humidity,
            self.humidity_rising,
            HUMIDITY_STEP,
            HUMIDITY_MIN,
            HUMIDITY_MAX,
        );
        (self.pressure, self.pressure_rising) = sweep(
            self.pressure,
            self.pressure_rising,
            PRESSURE_STEP,
            PRESSURE_MIN,
            PRESSURE_MAX,
        );
    }

    pub fn climate(&self) -> ClimateReading {
        ClimateReading {
            temperature: self.temperature as f32 / 100.0,
            humidity: ((self.humidity + 50) / 100).clamp(0, 100) as u8,
            pressure: self.pressure as f32 / 100.0,
        }
    }
}

fn sweep(value: i32, rising: bool, step: i32, min: i32, max: i32) -> (i32, bool) {
    let next = if rising { value + step } else { value - step };
    if next >= max {
        (max, false)
    } else if next <= min {
        (min, true)
    } else {
        (next, rising)
    }
}

/// Sensor and thermostat driven by wall-clock time elapsed between reads.
#[derive(Debug)]
pub struct Simulator {
    state: Mutex<SimState>,
    last_update: Mutex<Instant>,
    active_bank: u8,
}

impl Simulator {
    pub fn new(config: &SimulatorConfig) -> Self {
        info!(
            "Simulator initialized: T={:.2}°C H={}% P={} hPa hyst={:.1}°C",
            config.initial_temperature,
            config.initial_humidity,
            config.initial_pressure,
            config.hysteresis
        );
        Self {
            state: Mutex::new(SimState::new(config)),
            last_update: Mutex::new(Instant::now()),
            active_bank: config.active_bank,
        }
    }

    /// Change the thermostat target.
    pub fn set_setpoint(&self, setpoint: f32) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.setpoint != setpoint {
            info!("Setpoint changed: {:.1} -> {:.1}°C", state.setpoint, setpoint);
            state.setpoint = setpoint;
        }
    }

    /// Run every whole second that has passed since the last update.
    pub fn catch_up(&self) {
        let mut last = self.last_update.lock().unwrap_or_else(PoisonError::into_inner);
        let elapsed = last.elapsed().as_secs();
        if elapsed == 0 {
            return;
        }
        *last += std::time::Duration::from_secs(elapsed);
        drop(last);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for _ in 0..elapsed {
            state.step();
        }
    }

    /// Copy of the current simulation state.
    pub fn state(&self) -> SimState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SensorSource for Simulator {
    async fn read(&self) -> Result<ClimateReading, SensorError> {
        self.catch_up();
        Ok(self.state().climate())
    }
}

#[async_trait]
impl ThermostatSource for Simulator {
    async fn status(&self) -> ThermostatStatus {
        self.catch_up();
        let state = self.state();
        ThermostatStatus {
            setpoint: Some(state.setpoint),
            relay_on: state.heater_on,
            manual_mode: false,
            exception_active: false,
            active_bank: self.active_bank,
        }
    }
}
