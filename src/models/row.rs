//! Fixed-width output rows.

use serde::{Deserialize, Serialize};

use super::ReferenceRecord;

/// The reference district a row was matched to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: i64,
    pub name: String,
}

impl From<&ReferenceRecord> for MatchResult {
    fn from(record: &ReferenceRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
        }
    }
}

/// An input row together with its (optional) match.
///
/// The original fields are never mutated; match columns are only
/// materialized when the row is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRow {
    pub fields: Vec<String>,
    pub matched: Option<MatchResult>,
}

impl EnrichedRow {
    pub fn new(fields: Vec<String>, matched: Option<MatchResult>) -> Self {
        Self { fields, matched }
    }

    /// Fields plus the two match columns, empty when unmatched
    pub fn to_fixed_record(&self) -> Vec<String> {
        let mut record = self.fields.clone();
        match &self.matched {
            Some(m) => {
                record.push(m.id.to_string());
                record.push(m.name.clone());
            }
            None => {
                record.push(String::new());
                record.push(String::new());
            }
        }
        record
    }

    /// Fields plus the match columns only if matched
    pub fn to_ragged_record(&self) -> Vec<String> {
        let mut record = self.fields.clone();
        if let Some(m) = &self.matched {
            record.push(m.id.to_string());
            record.push(m.name.clone());
        }
        record
    }
}
