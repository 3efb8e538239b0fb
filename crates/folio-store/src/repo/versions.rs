//! Version history rows. Append-only: there is no update or delete here,
//! and the schema's triggers reject both.

#![allow(clippy::result_large_err)]

use crate::errors::{corrupt_row, from_rusqlite, serde_error, Result};
use crate::repo::{from_millis, to_millis};
use folio_core::model::{FieldBag, VersionDiff, VersionSnapshot};
use rusqlite::{Connection, OptionalExtension, Row};

/// A raw row from the `document_versions` table.
#[derive(Debug, Clone)]
struct VersionRow {
    document_id: String,
    version: i64,
    snapshot: String,
    edited_by: String,
    edit_reason: Option<String>,
    changes_summary: String,
    diff: String,
    created_at: i64,
}

const VERSION_COLUMNS: &str =
    "document_id, version, snapshot, edited_by, edit_reason, changes_summary, diff, created_at";

fn row_to_version_row(row: &Row<'_>) -> rusqlite::Result<VersionRow> {
    Ok(VersionRow {
        document_id: row.get(0)?,
        version: row.get(1)?,
        snapshot: row.get(2)?,
        edited_by: row.get(3)?,
        edit_reason: row.get(4)?,
        changes_summary: row.get(5)?,
        diff: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl VersionRow {
    fn into_snapshot(self) -> Result<VersionSnapshot> {
        let op = "load_version";
        let snapshot: FieldBag =
            serde_json::from_str(&self.snapshot).map_err(|e| serde_error(op, e))?;
        let diff: VersionDiff = serde_json::from_str(&self.diff).map_err(|e| serde_error(op, e))?;
        let created_at = from_millis(self.created_at)
            .ok_or_else(|| corrupt_row(op, &self.document_id, "timestamp out of range"))?;
        let version = u64::try_from(self.version)
            .map_err(|_| corrupt_row(op, &self.document_id, "negative version number"))?;

        Ok(VersionSnapshot {
            document: self.document_id,
            version,
            snapshot,
            edited_by: self.edited_by,
            edit_reason: self.edit_reason,
            changes_summary: self.changes_summary,
            diff,
            created_at,
        })
    }
}

fn collect_snapshots(rows: Vec<VersionRow>) -> Result<Vec<VersionSnapshot>> {
    rows.into_iter().map(VersionRow::into_snapshot).collect()
}

/// Append a version.
///
/// # Errors
///
/// - `Concurrency` when `(document, version)` is already taken
/// - `Persistence` when the document does not exist (foreign key) or SQLite fails
pub fn insert_version(conn: &Connection, version: &VersionSnapshot) -> Result<()> {
    let snapshot =
        serde_json::to_string(&version.snapshot).map_err(|e| serde_error("insert_version", e))?;
    let diff = serde_json::to_string(&version.diff).map_err(|e| serde_error("insert_version", e))?;

    conn.execute(
        &format!(
            "INSERT INTO document_versions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            VERSION_COLUMNS
        ),
        rusqlite::params![
            version.document,
            version.version as i64,
            snapshot,
            version.edited_by,
            version.edit_reason,
            version.changes_summary,
            diff,
            to_millis(version.created_at),
        ],
    )
    .map_err(|e| {
        from_rusqlite(e)
            .with_document_id(version.document.clone())
            .with_version(version.version)
    })?;

    Ok(())
}

/// The highest-numbered version of a document, if any.
pub fn latest_version(conn: &Connection, document_id: &str) -> Result<Option<VersionSnapshot>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM document_versions WHERE document_id = ?1
             ORDER BY version DESC LIMIT 1",
            VERSION_COLUMNS
        ),
        [document_id],
        row_to_version_row,
    )
    .optional()
    .map_err(from_rusqlite)?
    .map(VersionRow::into_snapshot)
    .transpose()
}

/// One specific version, if it exists.
pub fn fetch_version(
    conn: &Connection,
    document_id: &str,
    version: u64,
) -> Result<Option<VersionSnapshot>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM document_versions WHERE document_id = ?1 AND version = ?2",
            VERSION_COLUMNS
        ),
        rusqlite::params![document_id, version as i64],
        row_to_version_row,
    )
    .optional()
    .map_err(from_rusqlite)?
    .map(VersionRow::into_snapshot)
    .transpose()
}

/// A page of versions, newest first.
pub fn list_versions(
    conn: &Connection,
    document_id: &str,
    limit: u64,
    offset: u64,
) -> Result<Vec<VersionSnapshot>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM document_versions WHERE document_id = ?1
             ORDER BY version DESC LIMIT ?2 OFFSET ?3",
            VERSION_COLUMNS
        ))
        .map_err(from_rusqlite)?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(rusqlite::params![document_id, limit, offset], row_to_version_row)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    collect_snapshots(rows)
}

pub fn count_versions(conn: &Connection, document_id: &str) -> Result<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM document_versions WHERE document_id = ?1",
            [document_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)?;
    Ok(count.max(0) as u64)
}
