//! Enrichment driver: lookup, match and append for every input row.

use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::EnrichConfig;
use crate::error::{EnrichError, Result};
use crate::matcher::find_match;
use crate::models::{EnrichedRow, GeoPoint, MatchResult, ReferenceSet};
use crate::overpass::{BoundaryLookup, OverpassClient};
use crate::reference::ReferenceLoader;
use crate::table::{read_table, write_table, Table};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub header: Option<Vec<String>>,
    pub rows: Vec<EnrichedRow>,
    pub summary: EnrichSummary,
}

pub struct Enricher<L> {
    lookup: L,
    references: ReferenceSet,
    target_level: String,
    latitude_column: usize,
    longitude_column: usize,
    concurrency: usize,
    show_progress: bool,
}

impl<L: BoundaryLookup> Enricher<L> {
    pub fn new(config: &EnrichConfig, references: ReferenceSet, lookup: L) -> Self {
        Self {
            lookup,
            references,
            target_level: config.target_admin_level.clone(),
            latitude_column: config.latitude_column,
            longitude_column: config.longitude_column,
            concurrency: config.concurrency.max(1),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Enrich every data row of `table`, in file order.
    ///
    /// Coordinates are validated for all rows before the first lookup, and
    /// any failure aborts the whole run.
    pub async fn run(&self, table: Table) -> Result<EnrichOutcome> {
        // Line numbers are 1-based and count the header
        let first_line = if table.header.is_some() { 2 } else { 1 };
        let points = table
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                parse_point(row, idx + first_line, self.latitude_column, self.longitude_column)
            })
            .collect::<Result<Vec<_>>>()?;

        let pb = self.progress_bar(points.len() as u64);
        let pb_ref = &pb;

        let matches: Vec<Option<MatchResult>> = stream::iter(points)
            .map(|point| async move {
                let response = self.lookup.lookup(point).await?;
                pb_ref.inc(1);
                Ok::<_, EnrichError>(
                    find_match(&response, &self.references, &self.target_level)
                        .map(MatchResult::from),
                )
            })
            .buffered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await
            .inspect_err(|_| pb.abandon())?;

        pb.finish_with_message("Lookups complete");

        let rows: Vec<EnrichedRow> = table
            .rows
            .into_iter()
            .zip(matches)
            .map(|(fields, matched)| EnrichedRow::new(fields, matched))
            .collect();

        let matched = rows.iter().filter(|r| r.matched.is_some()).count();
        let summary = EnrichSummary {
            total: rows.len(),
            matched,
            unmatched: rows.len() - matched,
        };

        Ok(EnrichOutcome {
            header: table.header,
            rows,
            summary,
        })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
        {
            Ok(style) => pb.set_style(style.progress_chars("#>-")),
            Err(e) => warn!("Invalid progress template: {}", e),
        }
        pb
    }
}

fn parse_point(
    row: &[String],
    line: usize,
    lat_column: usize,
    lon_column: usize,
) -> Result<GeoPoint> {
    let lat = parse_coordinate(row, line, lat_column)?;
    let lon = parse_coordinate(row, line, lon_column)?;
    Ok(GeoPoint::new(lat, lon))
}

fn parse_coordinate(row: &[String], line: usize, column: usize) -> Result<f64> {
    // No trimming: padded values such as " -6.2" are rejected
    let value = row.get(column).map(String::as_str).unwrap_or_default();
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EnrichError::Coordinate {
            row: line,
            column,
            value: value.to_string(),
        })
}

/// Read the input, enrich it against `references`, and write the output.
///
/// The output file is only created once every row has been enriched.
pub async fn enrich_file<L: BoundaryLookup>(
    config: &EnrichConfig,
    references: ReferenceSet,
    lookup: L,
    show_progress: bool,
) -> Result<EnrichSummary> {
    let table = read_table(&config.input_path, config.has_header)?;

    let enricher = Enricher::new(config, references, lookup).with_progress(show_progress);
    let outcome = enricher.run(table).await?;

    write_table(
        &config.output_path,
        outcome.header.as_deref(),
        &outcome.rows,
        config.layout,
        [config.match_id_column.as_str(), config.match_name_column.as_str()],
    )?;

    Ok(outcome.summary)
}

/// Full run: load references from Postgres, then enrich via Overpass.
pub async fn run(config: &EnrichConfig) -> Result<EnrichSummary> {
    config.validate()?;

    let loader = ReferenceLoader::connect(&config.database_url).await?;
    let records = loader.load_all(&config.reference_query).await?;
    loader.close().await;

    if records.is_empty() {
        warn!("Reference table is empty; no rows will match");
    }

    let client = OverpassClient::new(
        &config.service_url,
        &config.target_admin_level,
        config.timeout_secs.map(Duration::from_secs),
    )?;

    let summary = enrich_file(config, ReferenceSet::new(records), client, true).await?;

    info!(
        "Enriched {} rows: {} matched, {} unmatched",
        summary.total, summary.matched, summary.unmatched
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputLayout;
    use crate::models::{OverpassElement, OverpassResponse, ReferenceRecord};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers with a level-7 boundary named after the integer part of the longitude.
    struct StubLookup {
        names: HashMap<i64, &'static str>,
        calls: AtomicUsize,
    }

    impl StubLookup {
        fn new(names: &[(i64, &'static str)]) -> Self {
            Self {
                names: names.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BoundaryLookup for StubLookup {
        async fn lookup(&self, point: GeoPoint) -> Result<OverpassResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let elements = match self.names.get(&(point.lon as i64)) {
                Some(name) => vec![OverpassElement {
                    element_type: "relation".to_string(),
                    tags: HashMap::from([
                        ("admin_level".to_string(), "7".to_string()),
                        ("name".to_string(), name.to_string()),
                    ]),
                    ..Default::default()
                }],
                None => Vec::new(),
            };
            Ok(OverpassResponse {
                elements,
                ..Default::default()
            })
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl BoundaryLookup for FailingLookup {
        async fn lookup(&self, _point: GeoPoint) -> Result<OverpassResponse> {
            Err(EnrichError::Http {
                status: reqwest::StatusCode::GATEWAY_TIMEOUT,
                body: "timeout".to_string(),
            })
        }
    }

    fn config() -> EnrichConfig {
        EnrichConfig {
            latitude_column: 1,
            longitude_column: 2,
            ..Default::default()
        }
    }

    fn row(name: &str, lat: &str, lon: &str) -> Vec<String> {
        vec![name.to_string(), lat.to_string(), lon.to_string()]
    }

    fn table(rows: Vec<Vec<String>>) -> Table {
        Table {
            header: Some(row("name", "lat", "lon")),
            rows,
        }
    }

    fn references() -> ReferenceSet {
        ReferenceSet::new(vec![ReferenceRecord::new(12, "Kebon Jeruk")])
    }

    #[tokio::test]
    async fn test_matched_and_unmatched_rows() {
        let lookup = StubLookup::new(&[(106, "kebon jeruk")]);
        let enricher = Enricher::new(&config(), references(), lookup).with_progress(false);

        let input = vec![row("Halte A", "-6.19", "106.77"), row("Halte B", "-6.19", "107.10")];
        let outcome = enricher.run(table(input.clone())).await.unwrap();

        assert_eq!(outcome.header, Some(row("name", "lat", "lon")));
        assert_eq!(
            outcome.rows[0].matched,
            Some(MatchResult {
                id: 12,
                name: "Kebon Jeruk".to_string()
            })
        );
        assert_eq!(outcome.rows[0].fields, input[0]);
        assert!(outcome.rows[1].matched.is_none());
        assert_eq!(outcome.rows[1].to_ragged_record(), input[1]);
        assert_eq!(
            outcome.summary,
            EnrichSummary {
                total: 2,
                matched: 1,
                unmatched: 1
            }
        );
        assert_eq!(enricher.lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_reference_set_passes_rows_through() {
        let lookup = StubLookup::new(&[(106, "Kebon Jeruk")]);
        let enricher = Enricher::new(&config(), ReferenceSet::default(), lookup).with_progress(false);

        let outcome = enricher
            .run(table(vec![row("Halte A", "-6.19", "106.77")]))
            .await
            .unwrap();
        assert!(outcome.rows.iter().all(|r| r.matched.is_none()));
        assert_eq!(outcome.summary.matched, 0);
    }

    #[tokio::test]
    async fn test_bad_latitude_aborts_before_any_lookup() {
        let lookup = StubLookup::new(&[(106, "Kebon Jeruk")]);
        let enricher = Enricher::new(&config(), references(), lookup).with_progress(false);

        let result = enricher
            .run(table(vec![
                row("Halte A", "-6.19", "106.77"),
                row("Halte B", "n/a", "106.77"),
            ]))
            .await;

        match result {
            Err(EnrichError::Coordinate { row, column, value }) => {
                assert_eq!(row, 3);
                assert_eq!(column, 1);
                assert_eq!(value, "n/a");
            }
            other => panic!("expected coordinate error, got {:?}", other),
        }
        assert_eq!(enricher.lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_padded_coordinate_is_rejected() {
        let enricher =
            Enricher::new(&config(), references(), StubLookup::new(&[])).with_progress(false);
        let result = enricher
            .run(table(vec![row("Halte A", " -6.19", "106.77")]))
            .await;

        match result {
            Err(EnrichError::Coordinate { row, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(value, " -6.19");
            }
            other => panic!("expected coordinate error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_column_is_coordinate_error() {
        let enricher =
            Enricher::new(&config(), references(), StubLookup::new(&[])).with_progress(false);
        let short = Table {
            header: None,
            rows: vec![vec!["only".to_string()]],
        };
        let result = enricher.run(short).await;
        assert!(matches!(result, Err(EnrichError::Coordinate { row: 1, .. })));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_fatal() {
        let enricher = Enricher::new(&config(), references(), FailingLookup).with_progress(false);
        let result = enricher
            .run(table(vec![row("Halte A", "-6.19", "106.77")]))
            .await;
        assert!(matches!(result, Err(EnrichError::Http { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_lookups_keep_row_order() {
        let lookup = StubLookup::new(&[(106, "Kebon Jeruk")]);
        let config = EnrichConfig {
            concurrency: 4,
            ..config()
        };
        let enricher = Enricher::new(&config, references(), lookup).with_progress(false);

        let rows: Vec<Vec<String>> = (0..10)
            .map(|i| {
                let lon = if i % 2 == 0 { "106.5" } else { "108.5" };
                row(&format!("Halte {}", i), "-6.2", lon)
            })
            .collect();
        let outcome = enricher.run(table(rows.clone())).await.unwrap();

        for (i, enriched) in outcome.rows.iter().enumerate() {
            assert_eq!(enriched.fields, rows[i]);
            assert_eq!(enriched.matched.is_some(), i % 2 == 0);
        }
        assert_eq!(outcome.summary.matched, 5);
    }

    #[tokio::test]
    async fn test_enrich_file_writes_fixed_width_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = EnrichConfig {
            input_path: dir.path().join("places.csv"),
            output_path: dir.path().join("places_mapped.csv"),
            layout: OutputLayout::Fixed,
            ..config()
        };
        fs::write(
            &config.input_path,
            "name,lat,lon\nHalte A,-6.19,106.77\nHalte B,-6.19,107.10\n",
        )
        .unwrap();

        let lookup = StubLookup::new(&[(106, "KEBON JERUK")]);
        let summary = enrich_file(&config, references(), lookup, false).await.unwrap();
        assert_eq!(summary.matched, 1);

        let written = fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(
            written,
            "name,lat,lon,kelurahan_id,kelurahan_name\n\
             Halte A,-6.19,106.77,12,Kebon Jeruk\n\
             Halte B,-6.19,107.10,,\n"
        );
    }

    #[tokio::test]
    async fn test_enrich_file_default_layout_keeps_unmatched_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = EnrichConfig {
            input_path: dir.path().join("places.csv"),
            output_path: dir.path().join("places_mapped.csv"),
            ..config()
        };
        fs::write(
            &config.input_path,
            "name,lat,lon\nHalte A,-6.19,106.77\nHalte B,-6.19,107.10\n",
        )
        .unwrap();

        let lookup = StubLookup::new(&[(106, "Kebon Jeruk")]);
        enrich_file(&config, references(), lookup, false).await.unwrap();

        let written = fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(
            written,
            "name,lat,lon\nHalte A,-6.19,106.77,12,Kebon Jeruk\nHalte B,-6.19,107.10\n"
        );
    }

    #[tokio::test]
    async fn test_failed_run_writes_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = EnrichConfig {
            input_path: dir.path().join("places.csv"),
            output_path: dir.path().join("places_mapped.csv"),
            ..config()
        };
        fs::write(&config.input_path, "name,lat,lon\nHalte A,north,106.77\n").unwrap();

        let lookup = StubLookup::new(&[(106, "Kebon Jeruk")]);
        let result = enrich_file(&config, references(), lookup, false).await;
        assert!(matches!(result, Err(EnrichError::Coordinate { .. })));
        assert!(!config.output_path.exists());
    }
}
