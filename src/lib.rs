//! kelurahan-mapper - enrich geocoded places with administrative districts
//!
//! Each row's coordinates are reverse-geocoded through the Overpass API and
//! the enclosing boundary is joined against a reference table of district names.

pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod overpass;
pub mod pipeline;
pub mod reference;
pub mod table;

pub use config::{EnrichConfig, OutputLayout};
pub use error::{EnrichError, Result};
pub use models::{EnrichedRow, GeoPoint, MatchResult, ReferenceRecord, ReferenceSet};
