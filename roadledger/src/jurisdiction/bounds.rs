//! Simplified jurisdiction bounding boxes.
//!
//! Each jurisdiction is approximated by an axis-aligned rectangle. Rectangles
//! of neighbouring states overlap along most shared borders, so a point in a
//! border zone may fall inside more than one box. Resolution always takes the
//! first box in table order; the table is kept alphabetical by code so that
//! order is stable and reviewable.

use serde::{Deserialize, Serialize};

use super::code::JurisdictionCode;
use crate::coord::Coordinate;

/// Axis-aligned bounding box for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionBounds {
    /// Jurisdiction this box approximates.
    pub code: JurisdictionCode,
    /// Southern edge in degrees.
    pub min_lat: f64,
    /// Northern edge in degrees.
    pub max_lat: f64,
    /// Western edge in degrees.
    pub min_lng: f64,
    /// Eastern edge in degrees.
    pub max_lng: f64,
}

impl JurisdictionBounds {
    /// Create a bounding box.
    pub fn new(
        code: impl Into<JurisdictionCode>,
        min_lat: f64,
        max_lat: f64,
        min_lng: f64,
        max_lng: f64,
    ) -> Self {
        Self {
            code: code.into(),
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Whether the coordinate lies inside the box (all four edges inclusive).
    #[inline]
    pub fn contains(&self, coord: &Coordinate) -> bool {
        coord.latitude >= self.min_lat
            && coord.latitude <= self.max_lat
            && coord.longitude >= self.min_lng
            && coord.longitude <= self.max_lng
    }
}

/// `(code, min_lat, max_lat, min_lng, max_lng)` for the contiguous United
/// States and DC.
const US_CONTIGUOUS: &[(&str, f64, f64, f64, f64)] = &[
    ("AL", 30.14, 35.01, -88.47, -84.89),
    ("AR", 33.00, 36.50, -94.62, -89.64),
    ("AZ", 31.33, 37.00, -114.82, -109.04),
    ("CA", 32.53, 42.01, -124.41, -114.13),
    ("CO", 36.99, 41.00, -109.06, -102.04),
    ("CT", 40.98, 42.05, -73.73, -71.79),
    ("DC", 38.79, 38.99, -77.12, -76.91),
    ("DE", 38.45, 39.84, -75.79, -75.05),
    ("FL", 24.40, 31.00, -87.63, -80.03),
    ("GA", 30.36, 35.00, -85.61, -80.84),
    ("IA", 40.38, 43.50, -96.64, -90.14),
    ("ID", 41.99, 49.00, -117.24, -111.04),
    ("IL", 36.97, 42.51, -91.51, -87.49),
    ("IN", 37.77, 41.76, -88.10, -84.78),
    ("KS", 36.99, 40.00, -102.05, -94.59),
    ("KY", 36.50, 39.15, -89.57, -81.96),
    ("LA", 28.93, 33.02, -94.04, -88.82),
    ("MA", 41.24, 42.89, -73.51, -69.93),
    ("MD", 37.91, 39.72, -79.49, -75.05),
    ("ME", 43.06, 47.46, -71.08, -66.95),
    ("MI", 41.70, 48.31, -90.42, -82.41),
    ("MN", 43.50, 49.38, -97.24, -89.49),
    ("MO", 35.99, 40.61, -95.77, -89.10),
    ("MS", 30.17, 35.00, -91.66, -88.10),
    ("MT", 44.36, 49.00, -116.05, -104.04),
    ("NC", 33.84, 36.59, -84.32, -75.46),
    ("ND", 45.94, 49.00, -104.05, -96.55),
    ("NE", 40.00, 43.00, -104.05, -95.31),
    ("NH", 42.70, 45.31, -72.56, -70.61),
    ("NJ", 38.93, 41.36, -75.56, -73.89),
    ("NM", 31.33, 37.00, -109.05, -103.00),
    ("NV", 35.00, 42.00, -120.01, -114.04),
    ("NY", 40.50, 45.02, -79.76, -71.86),
    ("OH", 38.40, 41.98, -84.82, -80.52),
    ("OK", 33.62, 37.00, -103.00, -94.43),
    ("OR", 41.99, 46.29, -124.57, -116.46),
    ("PA", 39.72, 42.27, -80.52, -74.69),
    ("RI", 41.15, 42.02, -71.91, -71.12),
    ("SC", 32.03, 35.22, -83.35, -78.54),
    ("SD", 42.48, 45.95, -104.06, -96.44),
    ("TN", 34.98, 36.68, -90.31, -81.65),
    ("TX", 25.84, 36.50, -106.65, -93.51),
    ("UT", 37.00, 42.00, -114.05, -109.04),
    ("VA", 36.54, 39.47, -83.68, -75.24),
    ("VT", 42.73, 45.02, -73.44, -71.46),
    ("WA", 45.54, 49.00, -124.76, -116.92),
    ("WI", 42.49, 47.31, -92.89, -86.25),
    ("WV", 37.20, 40.64, -82.64, -77.72),
    ("WY", 40.99, 45.01, -111.06, -104.05),
];

/// Built-in table for the 48 contiguous states plus DC, in code order.
pub fn us_contiguous_bounds() -> Vec<JurisdictionBounds> {
    US_CONTIGUOUS
        .iter()
        .map(|&(code, min_lat, max_lat, min_lng, max_lng)| {
            JurisdictionBounds::new(code, min_lat, max_lat, min_lng, max_lng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        let codes: Vec<&str> = US_CONTIGUOUS.iter().map(|row| row.0).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(codes, sorted);
        assert_eq!(codes.len(), 49);
    }

    #[test]
    fn test_boxes_are_well_formed() {
        for b in us_contiguous_bounds() {
            assert!(b.min_lat < b.max_lat, "{} latitude edges inverted", b.code);
            assert!(b.min_lng < b.max_lng, "{} longitude edges inverted", b.code);
        }
    }

    #[test]
    fn test_contains_is_inclusive_on_edges() {
        let b = JurisdictionBounds::new("XX", 10.0, 20.0, -50.0, -40.0);
        for (lat, lng) in [(10.0, -45.0), (20.0, -45.0), (15.0, -50.0), (15.0, -40.0)] {
            let c = Coordinate::new(lat, lng).unwrap();
            assert!(b.contains(&c), "edge point {} should be inside", c);
        }
        let outside = Coordinate::new(20.0001, -45.0).unwrap();
        assert!(!b.contains(&outside));
    }
}
