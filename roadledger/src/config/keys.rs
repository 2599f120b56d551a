//! Typed access to individual configuration values by `section.key` name.
//!
//! Backs `roadledger config get|set|list`.

use std::str::FromStr;

use thiserror::Error;

use super::parser::expand_tilde;
use super::settings::ConfigFile;
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    TrackingUserId,
    TrackingFlushThresholdMiles,
    TrackingFirstFixTimeoutSecs,
    TrackingMaxAccuracyMeters,

    SinkPath,
    SinkMaxAttempts,
    SinkInitialDelayMs,
    SinkMaxDelaySecs,

    IftaRatesFile,
    IftaFuelFile,

    LoggingDirectory,
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == lower)
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Canonical key name (e.g., "sink.max_attempts").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::TrackingUserId => "tracking.user_id",
            ConfigKey::TrackingFlushThresholdMiles => "tracking.flush_threshold_miles",
            ConfigKey::TrackingFirstFixTimeoutSecs => "tracking.first_fix_timeout_secs",
            ConfigKey::TrackingMaxAccuracyMeters => "tracking.max_accuracy_meters",
            ConfigKey::SinkPath => "sink.path",
            ConfigKey::SinkMaxAttempts => "sink.max_attempts",
            ConfigKey::SinkInitialDelayMs => "sink.initial_delay_ms",
            ConfigKey::SinkMaxDelaySecs => "sink.max_delay_secs",
            ConfigKey::IftaRatesFile => "ifta.rates_file",
            ConfigKey::IftaFuelFile => "ifta.fuel_file",
            ConfigKey::LoggingDirectory => "logging.directory",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Section name (e.g., "sink").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Key name within the section (e.g., "max_attempts").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::TrackingUserId => config.tracking.user_id.clone(),
            ConfigKey::TrackingFlushThresholdMiles => {
                config.tracking.flush_threshold_miles.to_string()
            }
            ConfigKey::TrackingFirstFixTimeoutSecs => {
                config.tracking.first_fix_timeout_secs.to_string()
            }
            ConfigKey::TrackingMaxAccuracyMeters => config
                .tracking
                .max_accuracy_meters
                .map(|m| m.to_string())
                .unwrap_or_default(),
            ConfigKey::SinkPath => path_to_string(&config.sink.path),
            ConfigKey::SinkMaxAttempts => config.sink.max_attempts.to_string(),
            ConfigKey::SinkInitialDelayMs => config.sink.initial_delay_ms.to_string(),
            ConfigKey::SinkMaxDelaySecs => config.sink.max_delay_secs.to_string(),
            ConfigKey::IftaRatesFile => config
                .ifta
                .rates_file
                .as_deref()
                .map(path_to_string)
                .unwrap_or_default(),
            ConfigKey::IftaFuelFile => config
                .ifta
                .fuel_file
                .as_deref()
                .map(path_to_string)
                .unwrap_or_default(),
            ConfigKey::LoggingDirectory => path_to_string(&config.logging.directory),
            ConfigKey::LoggingFile => config.logging.file.clone(),
        }
    }

    /// Validate and set the value in a config file.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let value = value.trim();
        let fail = |reason: &str| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::TrackingUserId => config.tracking.user_id = value.to_string(),
            ConfigKey::TrackingFlushThresholdMiles => {
                config.tracking.flush_threshold_miles =
                    value.parse().map_err(|_| fail("must be a positive number"))?;
            }
            ConfigKey::TrackingFirstFixTimeoutSecs => {
                config.tracking.first_fix_timeout_secs =
                    value.parse().map_err(|_| fail("must be a positive integer"))?;
            }
            ConfigKey::TrackingMaxAccuracyMeters => {
                config.tracking.max_accuracy_meters = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| fail("must be a positive number"))?)
                };
            }
            ConfigKey::SinkPath => config.sink.path = expand_tilde(value),
            ConfigKey::SinkMaxAttempts => {
                config.sink.max_attempts =
                    value.parse().map_err(|_| fail("must be a positive integer"))?;
            }
            ConfigKey::SinkInitialDelayMs => {
                config.sink.initial_delay_ms =
                    value.parse().map_err(|_| fail("must be a positive integer"))?;
            }
            ConfigKey::SinkMaxDelaySecs => {
                config.sink.max_delay_secs =
                    value.parse().map_err(|_| fail("must be a positive integer"))?;
            }
            ConfigKey::IftaRatesFile => config.ifta.rates_file = optional_path(value),
            ConfigKey::IftaFuelFile => config.ifta.fuel_file = optional_path(value),
            ConfigKey::LoggingDirectory => config.logging.directory = expand_tilde(value),
            ConfigKey::LoggingFile => config.logging.file = value.to_string(),
        }
        Ok(())
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::TrackingUserId => Box::new(NonEmptySpec),
            ConfigKey::TrackingFlushThresholdMiles => Box::new(PositiveNumberSpec { optional: false }),
            ConfigKey::TrackingFirstFixTimeoutSecs => Box::new(PositiveIntegerSpec),
            ConfigKey::TrackingMaxAccuracyMeters => Box::new(PositiveNumberSpec { optional: true }),
            ConfigKey::SinkPath => Box::new(NonEmptySpec),
            ConfigKey::SinkMaxAttempts => Box::new(PositiveIntegerSpec),
            ConfigKey::SinkInitialDelayMs => Box::new(PositiveIntegerSpec),
            ConfigKey::SinkMaxDelaySecs => Box::new(PositiveIntegerSpec),
            ConfigKey::IftaRatesFile => Box::new(AnyStringSpec),
            ConfigKey::IftaFuelFile => Box::new(AnyStringSpec),
            ConfigKey::LoggingDirectory => Box::new(NonEmptySpec),
            ConfigKey::LoggingFile => Box::new(NonEmptySpec),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TrackingUserId,
            ConfigKey::TrackingFlushThresholdMiles,
            ConfigKey::TrackingFirstFixTimeoutSecs,
            ConfigKey::TrackingMaxAccuracyMeters,
            ConfigKey::SinkPath,
            ConfigKey::SinkMaxAttempts,
            ConfigKey::SinkInitialDelayMs,
            ConfigKey::SinkMaxDelaySecs,
            ConfigKey::IftaRatesFile,
            ConfigKey::IftaFuelFile,
            ConfigKey::LoggingDirectory,
            ConfigKey::LoggingFile,
        ]
    }
}

/// Validation rule for a raw config value.
trait ValueSpecification {
    /// `Err(reason)` when the value is not acceptable.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

struct AnyStringSpec;

impl ValueSpecification for AnyStringSpec {
    fn is_satisfied_by(&self, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

struct NonEmptySpec;

impl ValueSpecification for NonEmptySpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must not be empty".to_string())
        } else {
            Ok(())
        }
    }
}

/// Integer of at least 1.
struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u32>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be a positive integer".to_string()),
        }
    }
}

struct PositiveNumberSpec {
    optional: bool,
}

impl ValueSpecification for PositiveNumberSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if self.optional && value.is_empty() {
            return Ok(());
        }
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() && n > 0.0 => Ok(()),
            _ => Err("must be a positive number".to_string()),
        }
    }
}

fn optional_path(value: &str) -> Option<std::path::PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(expand_tilde(value))
    }
}
