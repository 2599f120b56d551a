//! Coordinate → jurisdiction resolution.

use super::bounds::{us_contiguous_bounds, JurisdictionBounds};
use super::code::JurisdictionCode;
use crate::coord::Coordinate;

/// Resolves which jurisdiction a coordinate falls in.
///
/// Implementations are pure: no side effects, and an unmatched coordinate is
/// `None`, never an error. The accumulator only depends on this trait, so a
/// polygon or R-tree backed resolver can replace [`BoundingBoxResolver`]
/// without changing tracking semantics.
pub trait JurisdictionResolver: Send + Sync {
    /// The jurisdiction containing `coord`, if any.
    fn resolve(&self, coord: &Coordinate) -> Option<JurisdictionCode>;
}

/// First-match linear scan over a bounding-box table.
///
/// Overlapping boxes are resolved by table order: the first box containing
/// the coordinate wins.
#[derive(Debug, Clone)]
pub struct BoundingBoxResolver {
    table: Vec<JurisdictionBounds>,
}

impl BoundingBoxResolver {
    /// Create a resolver over a custom table. Order is significant.
    pub fn new(table: Vec<JurisdictionBounds>) -> Self {
        Self { table }
    }

    /// Resolver over the built-in contiguous-US table.
    pub fn us_contiguous() -> Self {
        Self::new(us_contiguous_bounds())
    }

    /// Bounds for a jurisdiction, if present in the table.
    pub fn bounds(&self, code: &JurisdictionCode) -> Option<&JurisdictionBounds> {
        self.table.iter().find(|b| &b.code == code)
    }

    /// Number of jurisdictions in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for BoundingBoxResolver {
    fn default() -> Self {
        Self::us_contiguous()
    }
}

impl JurisdictionResolver for BoundingBoxResolver {
    fn resolve(&self, coord: &Coordinate) -> Option<JurisdictionCode> {
        self.table
            .iter()
            .find(|b| b.contains(coord))
            .map(|b| b.code.clone())
    }
}
