//! Geographic coordinates and distance estimation
//!
//! Provides the validated [`Coordinate`] type shared by the tracker and the
//! great-circle [`haversine_miles`] estimator used to turn consecutive
//! position fixes into driven miles.

mod distance;
mod types;

pub use distance::{haversine_miles, DistanceEstimator, Haversine, EARTH_RADIUS_MILES};
pub use types::{CoordError, Coordinate, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DENVER: (f64, f64) = (39.74, -104.99);
    const KANSAS_CITY: (f64, f64) = (39.10, -94.58);

    fn coord(pair: (f64, f64)) -> Coordinate {
        Coordinate::new(pair.0, pair.1).unwrap()
    }

    #[test]
    fn test_valid_coordinate() {
        let c = Coordinate::new(40.7128, -74.0060).unwrap();
        assert_eq!(c.latitude, 40.7128);
        assert_eq!(c.longitude, -74.0060);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        let result = Coordinate::new(90.5, 0.0);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = Coordinate::new(0.0, -180.1);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NAN).is_err());
        assert!(Coordinate::new(f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_literal_coordinate_validate() {
        let c = Coordinate {
            latitude: 120.0,
            longitude: 0.0,
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_denver_to_kansas_city() {
        let d = haversine_miles(&coord(DENVER), &coord(KANSAS_CITY));
        // Straight-line distance is roughly 560 miles
        assert!((d - 560.0).abs() < 10.0, "Expected ~560 mi, got {}", d);
    }

    #[test]
    fn test_one_degree_latitude() {
        let a = coord((40.0, -100.0));
        let b = coord((41.0, -100.0));
        let d = haversine_miles(&a, &b);
        // 2πR/360 for R = 3959
        assert!((d - 69.097).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_antipodal_points() {
        let a = coord((0.0, 0.0));
        let b = coord((0.0, 180.0));
        let d = haversine_miles(&a, &b);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_MILES).abs() < 1e-6);
    }

    #[test]
    fn test_estimator_trait_matches_function() {
        let a = coord(DENVER);
        let b = coord(KANSAS_CITY);
        assert_eq!(Haversine.distance(&a, &b), haversine_miles(&a, &b));
    }

    #[test]
    fn test_display() {
        assert_eq!(coord(DENVER).to_string(), "(39.74000, -104.99000)");
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let a = Coordinate::new(lat1, lon1).unwrap();
            let b = Coordinate::new(lat2, lon2).unwrap();
            prop_assert!((haversine_miles(&a, &b) - haversine_miles(&b, &a)).abs() < 1e-9);
        }

        #[test]
        fn prop_distance_to_self_is_zero(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let a = Coordinate::new(lat, lon).unwrap();
            prop_assert_eq!(haversine_miles(&a, &a), 0.0);
        }

        #[test]
        fn prop_distance_bounded_by_half_circumference(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let a = Coordinate::new(lat1, lon1).unwrap();
            let b = Coordinate::new(lat2, lon2).unwrap();
            let d = haversine_miles(&a, &b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_MILES + 1e-6);
        }
    }
}
