//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};

/// WGS-84 valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A geographic position in decimal degrees (WGS-84).
///
/// Construction through [`Coordinate::new`] validates the range. The fields are
/// public so records can be deserialized and built literally; consumers that
/// mutate state call [`Coordinate::validate`] before trusting a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        let coord = Self {
            latitude,
            longitude,
        };
        coord.validate()?;
        Ok(coord)
    }

    /// Checks that both components are finite and inside the WGS-84 range.
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), CoordError> {
        if !self.latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(CoordError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(CoordError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Errors for malformed coordinates.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordError {
    /// Latitude is NaN, infinite, or outside -90.0 to 90.0
    #[error("Invalid latitude: {0} (must be between {} and {})", MIN_LAT, MAX_LAT)]
    InvalidLatitude(f64),
    /// Longitude is NaN, infinite, or outside -180.0 to 180.0
    #[error("Invalid longitude: {0} (must be between {} and {})", MIN_LON, MAX_LON)]
    InvalidLongitude(f64),
}
