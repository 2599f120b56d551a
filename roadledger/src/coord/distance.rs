//! Great-circle distance between coordinates.

use super::types::Coordinate;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Haversine great-circle distance in statute miles.
///
/// Straight-line over the sphere, not road distance. Symmetric, and zero for
/// identical inputs.
#[inline]
pub fn haversine_miles(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_MILES * c
}

/// Distance estimation seam used by the accumulator.
pub trait DistanceEstimator: Send + Sync {
    /// Distance between two coordinates in statute miles.
    fn distance(&self, a: &Coordinate, b: &Coordinate) -> f64;
}

/// The default haversine estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceEstimator for Haversine {
    fn distance(&self, a: &Coordinate, b: &Coordinate) -> f64 {
        haversine_miles(a, b)
    }
}
