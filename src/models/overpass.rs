//! Overpass API response shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level `[out:json]` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub version: f64,
    #[serde(default)]
    pub generator: String,
    #[serde(default)]
    pub osm3s: Osm3s,
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Osm3s {
    #[serde(default)]
    pub timestamp_osm_base: String,
    #[serde(default)]
    pub timestamp_areas_base: String,
    #[serde(default)]
    pub copyright: String,
}

/// A relation returned by `out tags bb`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type", default)]
    pub element_type: String,
    #[serde(default)]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub minlat: f64,
    pub minlon: f64,
    pub maxlat: f64,
    pub maxlon: f64,
}

impl OverpassElement {
    pub fn admin_level(&self) -> Option<&str> {
        self.tags.get("admin_level").map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.tags.get("name").map(String::as_str)
    }
}
