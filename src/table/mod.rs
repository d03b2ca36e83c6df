//! CSV input reader and output writer.

use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::config::OutputLayout;
use crate::error::{EnrichError, Result};
use crate::models::EnrichedRow;

/// Rows of a delimited file, with the header split off if present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

/// Read a comma-delimited file. Every record must have the same field count
/// and quotes must be well formed.
pub fn read_table(path: &Path, has_header: bool) -> Result<Table> {
    let csv_err = |source: csv::Error| EnrichError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let data = fs::read(path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            EnrichError::FileNotFound(path.to_path_buf())
        } else {
            csv_err(csv::Error::from(err))
        }
    })?;

    check_quoting(&data)
        .map_err(|msg| csv_err(io::Error::new(io::ErrorKind::InvalidData, msg).into()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(data.as_slice());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let header = if has_header && !rows.is_empty() {
        Some(rows.remove(0))
    } else {
        None
    };

    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(Table { header, rows })
}

#[derive(Clone, Copy)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Reject quoting the `csv` parser would otherwise repair silently: a bare
/// quote inside an unquoted field, text after a closing quote, or a quoted
/// field that never closes.
fn check_quoting(data: &[u8]) -> std::result::Result<(), String> {
    let mut state = QuoteState::FieldStart;
    let mut line = 1;

    for &byte in data {
        state = match (state, byte) {
            (QuoteState::Quoted, b'"') => QuoteState::QuoteInQuoted,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted, b'"') => QuoteState::Quoted,
            (_, b',' | b'\n' | b'\r') => QuoteState::FieldStart,
            (QuoteState::FieldStart, b'"') => QuoteState::Quoted,
            (QuoteState::Unquoted, b'"') => {
                return Err(format!("line {}: bare \" in unquoted field", line));
            }
            (QuoteState::QuoteInQuoted, _) => {
                return Err(format!("line {}: extraneous \" in quoted field", line));
            }
            (QuoteState::FieldStart | QuoteState::Unquoted, _) => QuoteState::Unquoted,
        };
        if byte == b'\n' {
            line += 1;
        }
    }

    match state {
        QuoteState::Quoted => Err(format!("line {}: quoted field is never closed", line)),
        _ => Ok(()),
    }
}

/// Write the header and enriched rows, replacing any existing file.
///
/// Rows go to a temporary file next to `path` that is renamed into place
/// once complete, so a failed write never leaves a partial output.
pub fn write_table(
    path: &Path,
    header: Option<&[String]>,
    rows: &[EnrichedRow],
    layout: OutputLayout,
    match_columns: [&str; 2],
) -> Result<()> {
    let write_err = |source: csv::Error| EnrichError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| write_err(e.into()))?;

    let mut writer = WriterBuilder::new()
        .flexible(layout == OutputLayout::Ragged)
        .from_writer(tmp);

    if let Some(header) = header {
        let mut record = header.to_vec();
        if layout == OutputLayout::Fixed {
            record.extend(match_columns.iter().map(|c| c.to_string()));
        }
        writer.write_record(&record).map_err(write_err)?;
    }

    for row in rows {
        let record = match layout {
            OutputLayout::Fixed => row.to_fixed_record(),
            OutputLayout::Ragged => row.to_ragged_record(),
        };
        writer.write_record(&record).map_err(write_err)?;
    }

    writer
        .flush()
        .map_err(|e| write_err(csv::Error::from(e)))?;
    let tmp = writer.into_inner().map_err(|e| {
        write_err(io::Error::new(e.error().kind(), e.error().to_string()).into())
    })?;
    tmp.persist(path).map_err(|e| write_err(e.error.into()))?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
