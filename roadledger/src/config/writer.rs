//! INI serialization: the commented representation written to config.ini.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let max_accuracy = config
        .tracking
        .max_accuracy_meters
        .map(|m| m.to_string())
        .unwrap_or_default();
    let rates_file = config
        .ifta
        .rates_file
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();
    let fuel_file = config
        .ifta
        .fuel_file
        .as_deref()
        .map(path_to_string)
        .unwrap_or_default();

    format!(
        r#"[tracking]
; Identifier stored with every mileage record
user_id = {}
; Emit a record after this many miles in one jurisdiction (default: 5)
flush_threshold_miles = {}
; Seconds to wait for the first GPS fix before giving up (default: 10)
first_fix_timeout_secs = {}
; Ignore fixes with a reported accuracy radius above this many meters
; Leave empty to accept every fix
max_accuracy_meters = {}

[sink]
; JSON-lines file that receives mileage records
path = {}
; Write attempts per record before it is reported as unsaved (default: 5)
max_attempts = {}
; First retry delay in milliseconds, doubled on each retry (default: 200)
initial_delay_ms = {}
; Upper bound on the retry delay in seconds (default: 30)
max_delay_secs = {}

[ifta]
; Jurisdiction rate table (JSON), required for reports
rates_file = {}
; Fuel purchases (JSON array)
fuel_file = {}

[logging]
directory = {}
file = {}
"#,
        config.tracking.user_id,
        config.tracking.flush_threshold_miles,
        config.tracking.first_fix_timeout_secs,
        max_accuracy,
        path_to_string(&config.sink.path),
        config.sink.max_attempts,
        config.sink.initial_delay_ms,
        config.sink.max_delay_secs,
        rates_file,
        fuel_file,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Convert a path to a string, collapsing the home directory to `~`.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_every_section() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[tracking]", "[sink]", "[ifta]", "[logging]"] {
            assert!(content.contains(section), "missing {section}");
        }
        assert!(content.contains("flush_threshold_miles = 5\n"));
        assert!(content.contains("max_accuracy_meters = \n"));
    }
}
