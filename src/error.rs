//! Error taxonomy for the enrichment pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Failed to connect to reference database: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Reference query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("Failed to scan reference row {row}: {source}")]
    Scan {
        row: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("Input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Row {row}: column {column} is not a coordinate ({value:?})")]
    Coordinate {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("Boundary lookup request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Boundary service returned {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode boundary response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EnrichError>;
