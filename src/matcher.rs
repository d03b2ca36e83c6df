//! Joins boundary lookup results against the reference districts.

use tracing::debug;

use crate::models::{OverpassResponse, ReferenceRecord, ReferenceSet};

/// Lowercase and drop all whitespace, so "Kebon  Jeruk" == "kebonjeruk".
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find the reference district named by a boundary at `target_level`.
///
/// Elements are visited in response order; an element at the target level
/// whose name has no reference counterpart is skipped and the scan moves on.
pub fn find_match<'a>(
    response: &OverpassResponse,
    references: &'a ReferenceSet,
    target_level: &str,
) -> Option<&'a ReferenceRecord> {
    for element in &response.elements {
        if element.admin_level() != Some(target_level) {
            continue;
        }
        // A boundary without a name tag never matches, not even a blank reference name
        let Some(name) = element.name() else {
            continue;
        };

        if let Some(record) = references.find_normalized(&normalize_name(name)) {
            return Some(record);
        }
        debug!("No reference district named {:?}", name);
    }

    None
}
