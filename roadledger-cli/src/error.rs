//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit code 1.

use std::fmt;
use std::path::PathBuf;
use std::process;

use roadledger::config::ConfigFileError;
use roadledger::ifta::{RateTableError, RecordStoreError};
use roadledger::position::SourceError;
use roadledger::tracking::TrackingError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Position source could not be opened
    Source(SourceError),
    /// Tracking session error
    Tracking(TrackingError),
    /// Rate table could not be loaded
    Rates(RateTableError),
    /// Mileage or fuel records could not be read
    Records(RecordStoreError),
    /// Invalid command-line input
    InvalidInput(String),
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Tracking(TrackingError::SourceUnavailable(_)) => {
                eprintln!();
                eprintln!("No GPS fix was received. Check that:");
                eprintln!("  1. The GPS app or device is broadcasting to this machine");
                eprintln!("  2. The UDP port matches (--udp-port)");
                eprintln!("  3. A firewall is not blocking incoming UDP");
            }
            CliError::Tracking(TrackingError::PermissionDenied) => {
                eprintln!();
                eprintln!("Location access must be granted before tracking can start.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Source(e) => write!(f, "Position source error: {}", e),
            CliError::Tracking(e) => write!(f, "Tracking failed: {}", e),
            CliError::Rates(e) => write!(f, "Rate table error: {}", e),
            CliError::Records(e) => write!(f, "Record store error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "{}", msg),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Source(e) => Some(e),
            CliError::Tracking(e) => Some(e),
            CliError::Rates(e) => Some(e),
            CliError::Records(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        CliError::Source(e)
    }
}

impl From<TrackingError> for CliError {
    fn from(e: TrackingError) -> Self {
        CliError::Tracking(e)
    }
}

impl From<RateTableError> for CliError {
    fn from(e: RateTableError) -> Self {
        CliError::Rates(e)
    }
}

impl From<RecordStoreError> for CliError {
    fn from(e: RecordStoreError) -> Self {
        CliError::Records(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::Config("bad".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad");

        let err = CliError::Tracking(TrackingError::NotActive);
        assert_eq!(err.to_string(), "Tracking failed: Tracking is not active");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err: CliError = TrackingError::AlreadyActive.into();
        assert!(err.source().is_some());
        assert!(CliError::InvalidInput("x".to_string()).source().is_none());
    }
}
