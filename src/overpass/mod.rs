//! Boundary lookups against the Overpass API.

mod client;
mod query;

pub use client::{decode_response, OverpassClient};
pub use query::build_query;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{GeoPoint, OverpassResponse};

/// Resolves the administrative boundaries enclosing a point
#[async_trait]
pub trait BoundaryLookup: Send + Sync {
    async fn lookup(&self, point: GeoPoint) -> Result<OverpassResponse>;
}
