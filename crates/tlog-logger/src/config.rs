//! Logger configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Logger configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where day files live and how long they are kept.
    pub storage: StorageConfig,
    /// Sampling cadence and checkpointing.
    pub sampling: SamplingConfig,
    /// Wall-clock settings.
    pub clock: ClockConfig,
    /// Simulated sensor and thermostat.
    pub simulator: SimulatorConfig,
}

impl Config {
    /// Load configuration from the default path, or defaults if it does not
    /// exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem found.
    ///
    /// # Example
    ///
    /// ```
    /// use tlog_logger::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.storage.validate());
        errors.extend(self.sampling.validate());
        errors.extend(self.clock.validate());
        errors.extend(self.simulator.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Flat directory holding `log_YYYYMMDD.bin` files.
    pub dir: PathBuf,
    /// Days of history to keep, today included. 0 disables cleanup.
    pub keep_days: u16,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: tlog_store::default_log_dir(),
            keep_days: 30,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.dir".to_string(),
                message: "log directory cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Minimum sampling interval in seconds.
pub const MIN_INTERVAL_SECS: u64 = 10;
/// Maximum sampling interval in seconds (1 hour).
pub const MAX_INTERVAL_SECS: u64 = 3600;

/// Sampling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between samples.
    pub interval_secs: u64,
    /// Minutes between checkpoint saves of the live buffer. 0 disables.
    pub checkpoint_minutes: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            checkpoint_minutes: 10,
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.interval_secs < MIN_INTERVAL_SECS {
            errors.push(ValidationError {
                field: "sampling.interval_secs".to_string(),
                message: format!(
                    "interval {} is too short (minimum {} seconds)",
                    self.interval_secs, MIN_INTERVAL_SECS
                ),
            });
        } else if self.interval_secs > MAX_INTERVAL_SECS {
            errors.push(ValidationError {
                field: "sampling.interval_secs".to_string(),
                message: format!(
                    "interval {} is too long (maximum {} seconds / 1 hour)",
                    self.interval_secs, MAX_INTERVAL_SECS
                ),
            });
        }

        if self.checkpoint_minutes > 1440 {
            errors.push(ValidationError {
                field: "sampling.checkpoint_minutes".to_string(),
                message: format!(
                    "checkpoint every {} minutes is longer than a day",
                    self.checkpoint_minutes
                ),
            });
        }

        errors
    }
}

/// Wall-clock configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Offset from UTC, in minutes, used to derive the local date and minute.
    pub utc_offset_minutes: i16,
}

impl ClockConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(-720..=840).contains(&self.utc_offset_minutes) {
            errors.push(ValidationError {
                field: "clock.utc_offset_minutes".to_string(),
                message: format!(
                    "offset {} is outside -720..=840 (UTC-12:00 to UTC+14:00)",
                    self.utc_offset_minutes
                ),
            });
        }

        errors
    }
}

/// Simulated sensor and thermostat configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Starting temperature in °C.
    pub initial_temperature: f32,
    /// Starting humidity in %.
    pub initial_humidity: u8,
    /// Starting pressure in hPa.
    pub initial_pressure: u16,
    /// Thermostat target in °C.
    pub setpoint: f32,
    /// Heater switches off at setpoint + hysteresis.
    pub hysteresis: f32,
    /// Program bank reported with every sample.
    pub active_bank: u8,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 19.0,
            initial_humidity: 50,
            initial_pressure: 1013,
            setpoint: 20.0,
            hysteresis: 0.3,
            active_bank: 0,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(5.0..=35.0).contains(&self.initial_temperature) {
            errors.push(ValidationError {
                field: "simulator.initial_temperature".to_string(),
                message: format!(
                    "{} °C is outside the simulated range 5-35 °C",
                    self.initial_temperature
                ),
            });
        }
        if self.initial_humidity > 100 {
            errors.push(ValidationError {
                field: "simulator.initial_humidity".to_string(),
                message: format!("{}% is not a humidity", self.initial_humidity),
            });
        }
        if !(self.hysteresis >= 0.0 && self.hysteresis <= 5.0) {
            errors.push(ValidationError {
                field: "simulator.hysteresis".to_string(),
                message: format!("hysteresis {} must be between 0 and 5 °C", self.hysteresis),
            });
        }
        if self.active_bank > 3 {
            errors.push(ValidationError {
                field: "simulator.active_bank".to_string(),
                message: format!("bank {} does not exist (0-3)", self.active_bank),
            });
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `sampling.interval_secs`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tlog")
        .join("logger.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.storage.keep_days, 30);
        assert_eq!(config.storage.dir, tlog_store::default_log_dir());
        assert_eq!(config.sampling.interval_secs, 60);
        assert_eq!(config.sampling.checkpoint_minutes, 10);
        assert_eq!(config.clock.utc_offset_minutes, 0);
        assert_eq!(config.simulator.initial_humidity, 50);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
            [storage]
            dir = "/spiffs"

            [clock]
            utc_offset_minutes = 60
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.dir, PathBuf::from("/spiffs"));
        assert_eq!(config.storage.keep_days, 30);
        assert_eq!(config.clock.utc_offset_minutes, 60);
        assert_eq!(config.sampling, SamplingConfig::default());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("logger.toml");

        let config = Config {
            storage: StorageConfig {
                dir: PathBuf::from("/tmp/tlog"),
                keep_days: 7,
            },
            sampling: SamplingConfig {
                interval_secs: 30,
                checkpoint_minutes: 0,
            },
            clock: ClockConfig {
                utc_offset_minutes: -300,
            },
            simulator: SimulatorConfig {
                setpoint: 21.5,
                ..SimulatorConfig::default()
            },
        };

        config.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/logger.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[sampling\ninterval_secs = ").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_interval_bounds() {
        let mut config = SamplingConfig::default();
        config.interval_secs = 5;
        assert_eq!(config.validate().len(), 1);
        config.interval_secs = 3601;
        assert_eq!(config.validate().len(), 1);
        config.interval_secs = 3600;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.storage.dir = PathBuf::new();
        config.clock.utc_offset_minutes = 900;
        config.simulator.active_bank = 4;
        config.simulator.hysteresis = f32::NAN;

        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation errors");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "storage.dir",
                "clock.utc_offset_minutes",
                "simulator.hysteresis",
                "simulator.active_bank"
            ]
        );
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = ConfigError::Validation(vec![ValidationError {
            field: "sampling.interval_secs".to_string(),
            message: "too short".to_string(),
        }]);
        assert_eq!(
            err.to_string(),
            "Configuration validation failed:\n  - sampling.interval_secs: too short"
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("tlog/logger.toml"));
    }
}
