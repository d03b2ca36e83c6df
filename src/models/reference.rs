//! Reference districts loaded from the relational store.

use serde::{Deserialize, Serialize};

use crate::matcher::normalize_name;

/// A named administrative district with a stable identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: i64,
    pub name: String,
}

impl ReferenceRecord {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Reference records in stored order, each paired with its normalized name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    records: Vec<ReferenceRecord>,
    normalized: Vec<String>,
}

impl ReferenceSet {
    pub fn new(records: Vec<ReferenceRecord>) -> Self {
        let normalized = records.iter().map(|r| normalize_name(&r.name)).collect();
        Self {
            records,
            normalized,
        }
    }

    /// First record whose normalized name equals `normalized`
    pub fn find_normalized(&self, normalized: &str) -> Option<&ReferenceRecord> {
        self.normalized
            .iter()
            .position(|n| n == normalized)
            .map(|idx| &self.records[idx])
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<ReferenceRecord>> for ReferenceSet {
    fn from(records: Vec<ReferenceRecord>) -> Self {
        Self::new(records)
    }
}
