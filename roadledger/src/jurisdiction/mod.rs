//! Jurisdiction resolution
//!
//! Maps a coordinate to the taxing jurisdiction (US state) it falls in, using
//! simplified axis-aligned bounding boxes.
//!
//! # Limitations
//!
//! Boxes are rectangles, not state outlines. Neighbouring boxes overlap along
//! many borders and resolution is first-match in table order, so attribution
//! near a border can be wrong by a few miles. Accurate attribution would need
//! polygon data; the [`JurisdictionResolver`] trait is the seam for that.

mod bounds;
mod code;
mod resolver;

pub use bounds::{us_contiguous_bounds, JurisdictionBounds};
pub use code::JurisdictionCode;
pub use resolver::{BoundingBoxResolver, JurisdictionResolver};
