use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::field::FieldBag;

/// Structural difference between two document states.
///
/// Derived, never authoritative: restores copy `VersionSnapshot::snapshot`
/// and never replay diffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VersionDiff {
    /// Changed field names, in schema order
    pub fields_changed: Vec<String>,
    pub added_list_items: BTreeMap<String, Vec<String>>,
    pub removed_list_items: BTreeMap<String, Vec<String>>,
    /// Character count of new content minus old content
    pub content_length_delta: i64,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.fields_changed.is_empty()
            && self.added_list_items.is_empty()
            && self.removed_list_items.is_empty()
            && self.content_length_delta == 0
    }
}

/// Immutable full-state capture of a document at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub document: String,
    /// Starts at 1 and increases by one per document
    pub version: u64,
    pub snapshot: FieldBag,
    pub edited_by: String,
    pub edit_reason: Option<String>,
    pub changes_summary: String,
    pub diff: VersionDiff,
    pub created_at: DateTime<Utc>,
}

/// One page of history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub versions: Vec<VersionSnapshot>,
    pub total: u64,
    pub has_more: bool,
}

impl HistoryPage {
    /// `has_more` is true when rows exist beyond `offset + versions.len()`.
    pub fn new(versions: Vec<VersionSnapshot>, offset: u64, total: u64) -> Self {
        let has_more = offset + (versions.len() as u64) < total;
        Self {
            versions,
            total,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_more() {
        assert!(HistoryPage::new(Vec::new(), 0, 3).has_more);
        assert!(!HistoryPage::new(Vec::new(), 3, 3).has_more);
        assert!(!HistoryPage::new(Vec::new(), 10, 3).has_more);
    }

    #[test]
    fn test_diff_serializes_camel_case() {
        let json = serde_json::to_value(VersionDiff::default()).unwrap();
        assert!(json.get("fieldsChanged").is_some());
        assert!(json.get("contentLengthDelta").is_some());
    }
}
