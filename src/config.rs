use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EnrichError, Result};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// How match results are laid out in the output file.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// Match columns are appended only to matched rows; the header and
    /// unmatched rows are written unchanged.
    #[default]
    Ragged,
    /// Every row carries the two match columns, empty when unmatched.
    Fixed,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EnrichConfig {
    pub database_url: String,
    pub reference_query: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub has_header: bool,
    pub latitude_column: usize,
    pub longitude_column: usize,
    pub service_url: String,
    pub target_admin_level: String,
    pub timeout_secs: Option<u64>,
    pub concurrency: usize,
    pub layout: OutputLayout,
    pub match_id_column: String,
    pub match_name_column: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://postgres@localhost:5432/balto_db".to_string(),
            reference_query: "SELECT * FROM daftar_kelurahan".to_string(),
            input_path: PathBuf::from("public places.csv"),
            output_path: PathBuf::from("public places_mapped.csv"),
            has_header: true,
            latitude_column: 13,
            longitude_column: 14,
            service_url: DEFAULT_OVERPASS_URL.to_string(),
            target_admin_level: "7".to_string(),
            timeout_secs: None,
            concurrency: 1,
            layout: OutputLayout::Ragged,
            match_id_column: "kelurahan_id".to_string(),
            match_name_column: "kelurahan_name".to_string(),
        }
    }
}

impl EnrichConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EnrichError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: EnrichConfig = toml::from_str(&content).map_err(|e| {
            EnrichError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(EnrichError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.latitude_column == self.longitude_column {
            return Err(EnrichError::Config(format!(
                "latitude and longitude share column {}",
                self.latitude_column
            )));
        }
        if self.target_admin_level.trim().is_empty() {
            return Err(EnrichError::Config(
                "target_admin_level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
