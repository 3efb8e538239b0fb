//! Version snapshot construction.
//!
//! Pure: given the latest stored snapshot (if any) and the state to capture,
//! produce the next immutable [`VersionSnapshot`]. Number assignment is only
//! race-free when the caller holds the document's write transaction.

use chrono::{DateTime, Utc};

use crate::diff::{changes_summary, compute_diff, DiffSchema};
use crate::model::{FieldBag, VersionSnapshot};

/// Reason recorded on the snapshot taken just before a restore
pub fn before_restore_reason(target_version: u64) -> String {
    format!("Before restoring to version {}", target_version)
}

/// Reason recorded on the snapshot of the restored state when the caller gave none
pub fn after_restore_reason(target_version: u64) -> String {
    format!("Restored to version {}", target_version)
}

/// Input for [`next_snapshot`]
pub struct SnapshotRequest<'a> {
    pub document_id: &'a str,
    pub state: &'a FieldBag,
    pub editor: &'a str,
    pub reason: Option<&'a str>,
    pub now: DateTime<Utc>,
}

pub fn next_snapshot(
    latest: Option<&VersionSnapshot>,
    request: SnapshotRequest<'_>,
    schema: &DiffSchema,
) -> VersionSnapshot {
    let version = latest.map(|v| v.version + 1).unwrap_or(1);
    let diff = compute_diff(latest.map(|v| &v.snapshot), request.state, schema);
    let summary = changes_summary(request.reason, &diff, &schema.tag_field);

    VersionSnapshot {
        document: request.document_id.to_string(),
        version,
        snapshot: request.state.clone(),
        edited_by: request.editor.to_string(),
        edit_reason: request.reason.map(str::to_string),
        changes_summary: summary,
        diff,
        created_at: request.now,
    }
}
