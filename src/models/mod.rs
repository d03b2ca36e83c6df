//! Core data models for the enrichment pipeline.

pub mod overpass;
pub mod point;
pub mod reference;
pub mod row;

pub use overpass::{Bounds, Osm3s, OverpassElement, OverpassResponse};
pub use point::GeoPoint;
pub use reference::{ReferenceRecord, ReferenceSet};
pub use row::{EnrichedRow, MatchResult};
