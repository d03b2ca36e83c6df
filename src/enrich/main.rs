//! Batch enrichment of a places CSV with kelurahan identifiers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kelurahan_mapper::config::{EnrichConfig, OutputLayout};
use kelurahan_mapper::pipeline;

#[derive(Parser, Debug)]
#[command(name = "enrich")]
#[command(about = "Map place coordinates to kelurahan reference districts")]
struct Args {
    /// TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input CSV
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output CSV, overwritten if it exists
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Postgres URL for the reference table
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Overpass interpreter URL
    #[arg(long)]
    service_url: Option<String>,

    /// admin_level to match against the reference table
    #[arg(long)]
    admin_level: Option<String>,

    /// Maximum in-flight lookups
    #[arg(long)]
    concurrency: Option<usize>,

    /// Pad unmatched rows so every row carries the match columns
    #[arg(long)]
    fixed: bool,
}

impl Args {
    fn into_config(self) -> Result<EnrichConfig> {
        let mut config = match &self.config {
            Some(path) => EnrichConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EnrichConfig::default(),
        };

        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(url) = self.service_url {
            config.service_url = url;
        }
        if let Some(level) = self.admin_level {
            config.target_admin_level = level;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.fixed {
            config.layout = OutputLayout::Fixed;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Args::parse().into_config()?;

    info!("Kelurahan enrichment");
    info!("Input: {}", config.input_path.display());

    match pipeline::run(&config).await {
        Ok(_) => {
            info!("Output written to {}", config.output_path.display());
            Ok(())
        }
        Err(e) => {
            error!("Enrichment aborted, no output written: {}", e);
            Err(e).context("Enrichment failed")
        }
    }
}
