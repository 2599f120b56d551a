//! Configuration
//!
//! User settings live in `~/.roadledger/config.ini`:
//!
//! ```ini
//! [tracking]
//! user_id = driver-1
//! flush_threshold_miles = 5
//!
//! [sink]
//! path = ~/.roadledger/mileage.jsonl
//!
//! [ifta]
//! rates_file = ~/.roadledger/rates-2025-q1.json
//! ```
//!
//! Missing files and keys fall back to defaults. [`ConfigKey`] gives typed
//! get/set access for the CLI.

mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    ConfigFile, IftaSettings, LoggingSettings, SinkSettings, TrackingSettings, DEFAULT_LOG_FILE,
    DEFAULT_MILEAGE_FILE, DEFAULT_USER_ID,
};
