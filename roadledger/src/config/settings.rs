//! Settings structs for each `[section]` of config.ini, plus their defaults
//! and conversions into runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::tracking::{
    AccumulatorConfig, RetryPolicy, TrackingConfig, DEFAULT_FIRST_FIX_TIMEOUT_SECS,
    DEFAULT_FLUSH_THRESHOLD_MILES, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_SECS,
};

/// Default user id when none is configured.
pub const DEFAULT_USER_ID: &str = "default";

/// Default mileage file name inside the config directory.
pub const DEFAULT_MILEAGE_FILE: &str = "mileage.jsonl";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "roadledger.log";

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub tracking: TrackingSettings,
    pub sink: SinkSettings,
    pub ifta: IftaSettings,
    pub logging: LoggingSettings,
}

/// `[tracking]`
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    /// Owner recorded on every mileage record.
    pub user_id: String,
    pub flush_threshold_miles: f64,
    pub first_fix_timeout_secs: u64,
    /// Drop fixes less accurate than this. `None` keeps every fix.
    pub max_accuracy_meters: Option<f64>,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            flush_threshold_miles: DEFAULT_FLUSH_THRESHOLD_MILES,
            first_fix_timeout_secs: DEFAULT_FIRST_FIX_TIMEOUT_SECS,
            max_accuracy_meters: None,
        }
    }
}

/// `[sink]`
#[derive(Debug, Clone, PartialEq)]
pub struct SinkSettings {
    /// JSON-lines mileage file.
    pub path: PathBuf,
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_secs: u64,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            path: super::file::config_directory().join(DEFAULT_MILEAGE_FILE),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

/// `[ifta]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IftaSettings {
    /// Rate table JSON.
    pub rates_file: Option<PathBuf>,
    /// Fuel purchases JSON.
    pub fuel_file: Option<PathBuf>,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: super::file::config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl ConfigFile {
    /// Retry policy for sink writes.
    pub fn retry_policy(&self) -> RetryPolicy {
        if self.sink.max_attempts <= 1 {
            return RetryPolicy::None;
        }
        RetryPolicy::exponential_with(
            self.sink.max_attempts,
            Duration::from_millis(self.sink.initial_delay_ms),
            Duration::from_secs(self.sink.max_delay_secs),
        )
    }

    pub fn accumulator_config(&self) -> AccumulatorConfig {
        AccumulatorConfig {
            flush_threshold_miles: self.tracking.flush_threshold_miles,
        }
    }

    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig {
            accumulator: self.accumulator_config(),
            first_fix_timeout: Duration::from_secs(self.tracking.first_fix_timeout_secs),
            max_accuracy_meters: self.tracking.max_accuracy_meters,
            retry: self.retry_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_runtime_defaults() {
        let config = ConfigFile::default();
        let tracking = config.tracking_config();

        assert_eq!(tracking.accumulator.flush_threshold_miles, 5.0);
        assert_eq!(tracking.first_fix_timeout, Duration::from_secs(10));
        assert!(tracking.max_accuracy_meters.is_none());
        assert_eq!(tracking.retry, RetryPolicy::default());
        assert!(config.sink.path.ends_with("mileage.jsonl"));
    }

    #[test]
    fn test_single_attempt_disables_retry() {
        let mut config = ConfigFile::default();
        config.sink.max_attempts = 1;
        assert_eq!(config.retry_policy(), RetryPolicy::None);
    }
}
