//! INI parsing: the single place where INI key names map to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` into a `ConfigFile`, overlaying defaults with any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        if let Some(v) = non_empty(section, "user_id") {
            config.tracking.user_id = v.to_string();
        }
        if let Some(v) = section.get("flush_threshold_miles") {
            config.tracking.flush_threshold_miles = positive_number(
                "tracking",
                "flush_threshold_miles",
                v,
            )?;
        }
        if let Some(v) = section.get("first_fix_timeout_secs") {
            config.tracking.first_fix_timeout_secs =
                positive_integer("tracking", "first_fix_timeout_secs", v)?;
        }
        if let Some(v) = section.get("max_accuracy_meters") {
            config.tracking.max_accuracy_meters = if v.trim().is_empty() {
                None
            } else {
                Some(positive_number("tracking", "max_accuracy_meters", v)?)
            };
        }
    }

    // [sink] section
    if let Some(section) = ini.section(Some("sink")) {
        if let Some(v) = non_empty(section, "path") {
            config.sink.path = expand_tilde(v);
        }
        if let Some(v) = section.get("max_attempts") {
            config.sink.max_attempts = positive_integer("sink", "max_attempts", v)?;
        }
        if let Some(v) = section.get("initial_delay_ms") {
            config.sink.initial_delay_ms = positive_integer("sink", "initial_delay_ms", v)?;
        }
        if let Some(v) = section.get("max_delay_secs") {
            config.sink.max_delay_secs = positive_integer("sink", "max_delay_secs", v)?;
        }
    }

    // [ifta] section
    if let Some(section) = ini.section(Some("ifta")) {
        config.ifta.rates_file = non_empty(section, "rates_file").map(expand_tilde);
        config.ifta.fuel_file = non_empty(section, "fuel_file").map(expand_tilde);
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn positive_number(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let n: f64 = parse_value(section, key, value, "must be a positive number")?;
    if n.is_finite() && n > 0.0 {
        Ok(n)
    } else {
        Err(invalid(section, key, value, "must be a positive number"))
    }
}

/// Integer of at least 1, matching what `ConfigKey::set` accepts.
fn positive_integer<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + Default + PartialEq,
{
    let n: T = parse_value(section, key, value, "must be a positive integer")?;
    if n == T::default() {
        return Err(invalid(section, key, value, "must be a positive integer"));
    }
    Ok(n)
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
