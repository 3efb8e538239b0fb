//! Document rows: current state plus the edit lease columns.

#![allow(clippy::result_large_err)]

use crate::errors::{corrupt_row, from_rusqlite, is_unique_violation, serde_error, Result};
use crate::repo::{from_millis, to_millis};
use chrono::{DateTime, Utc};
use folio_core::errors::{ExError, FolioError};
use folio_core::model::{Document, EditState, FieldBag};
use rusqlite::{Connection, OptionalExtension, Row};

/// A raw row from the `documents` table.
#[derive(Debug, Clone)]
struct DocumentRow {
    id: String,
    state: String,
    locked: bool,
    locked_by: Option<String>,
    locked_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

const SELECT_DOCUMENT: &str = "SELECT id, state, locked, locked_by, locked_at, created_at, updated_at
     FROM documents WHERE id = ?1";

fn row_to_document_row(row: &Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok(DocumentRow {
        id: row.get(0)?,
        state: row.get(1)?,
        locked: row.get(2)?,
        locked_by: row.get(3)?,
        locked_at: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl DocumentRow {
    fn into_document(self) -> Result<Document> {
        let op = "load_document";
        let state: FieldBag = serde_json::from_str(&self.state).map_err(|e| serde_error(op, e))?;
        let timestamp = |ms: i64| {
            from_millis(ms).ok_or_else(|| corrupt_row(op, &self.id, "timestamp out of range"))
        };
        let locked_at = self.locked_at.map(timestamp).transpose()?;
        let edit = EditState::from_parts(self.locked, self.locked_by.clone(), locked_at)
            .ok_or_else(|| corrupt_row(op, &self.id, "inconsistent lock columns"))?;

        Ok(Document {
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
            id: self.id,
            state,
            edit,
        })
    }
}

/// Insert a new document.
///
/// # Errors
///
/// - `AlreadyExists` when a document with the same id is present
/// - `Persistence` on other SQLite failures
pub fn insert_document(conn: &Connection, document: &Document) -> Result<()> {
    let state =
        serde_json::to_string(&document.state).map_err(|e| serde_error("insert_document", e))?;
    conn.execute(
        "INSERT INTO documents (id, state, locked, locked_by, locked_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            document.id,
            state,
            document.edit.locked,
            document.edit.locked_by,
            document.edit.locked_at.map(to_millis),
            to_millis(document.created_at),
            to_millis(document.updated_at),
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            ExError::from(FolioError::DocumentAlreadyExists {
                document_id: document.id.clone(),
            })
            .with_op("insert_document")
        } else {
            from_rusqlite(e)
        }
    })?;

    Ok(())
}

/// Load a document, or `None` if it does not exist.
pub fn find_document(conn: &Connection, document_id: &str) -> Result<Option<Document>> {
    conn.query_row(SELECT_DOCUMENT, [document_id], row_to_document_row)
        .optional()
        .map_err(from_rusqlite)?
        .map(DocumentRow::into_document)
        .transpose()
}

/// Load a document.
///
/// # Errors
///
/// - `NotFound` when no document has the given id
pub fn load_document(conn: &Connection, document_id: &str) -> Result<Document> {
    find_document(conn, document_id)?.ok_or_else(|| {
        ExError::from(FolioError::DocumentNotFound {
            document_id: document_id.to_string(),
        })
        .with_op("load_document")
    })
}

fn require_updated(changed: usize, document_id: &str, op: &str) -> Result<()> {
    if changed == 0 {
        return Err(ExError::from(FolioError::DocumentNotFound {
            document_id: document_id.to_string(),
        })
        .with_op(op.to_string()));
    }
    Ok(())
}

/// Replace a document's state bag.
pub fn update_state(
    conn: &Connection,
    document_id: &str,
    state: &FieldBag,
    updated_at: DateTime<Utc>,
) -> Result<()> {
    let state = serde_json::to_string(state).map_err(|e| serde_error("update_state", e))?;
    let changed = conn
        .execute(
            "UPDATE documents SET state = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![state, to_millis(updated_at), document_id],
        )
        .map_err(from_rusqlite)?;
    require_updated(changed, document_id, "update_state")
}

/// Overwrite the three lease columns.
///
/// Leaves `updated_at` alone: taking or dropping a lease is not an edit.
pub fn set_edit_state(conn: &Connection, document_id: &str, edit: &EditState) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE documents SET locked = ?1, locked_by = ?2, locked_at = ?3 WHERE id = ?4",
            rusqlite::params![
                edit.locked,
                edit.locked_by,
                edit.locked_at.map(to_millis),
                document_id
            ],
        )
        .map_err(from_rusqlite)?;
    require_updated(changed, document_id, "set_edit_state")
}
