//! Document and version history commands with boundary logging.
//!
//! Writes run in one immediate transaction each: the lease check, the
//! version-number read, the snapshot insert and the document update commit
//! together or not at all. The `(document, version)` unique key backs this
//! up by turning a lost race into a `Concurrency` error.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use folio_core::diff::compute_diff;
use folio_core::errors::{ExError, FolioError};
use folio_core::lease::is_expired;
use folio_core::model::{
    Actor, Document, EditState, FieldBag, HistoryPage, VersionDiff, VersionSnapshot,
};
use folio_core::notifier::ChangeEvent;
use folio_core::rules::{validate_field_bag, validate_reason};
use folio_core::versioning::{
    after_restore_reason, before_restore_reason, next_snapshot, SnapshotRequest,
};
use folio_core::{log_op_end, log_op_error, log_op_start};
use folio_store::db::begin_immediate;
use folio_store::errors::{from_rusqlite, Result};
use folio_store::repo::{documents, versions};
use rusqlite::Connection;
use std::time::Instant;

use crate::EngineContext;

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Append the next version of `document_id` capturing `state`.
///
/// Caller must hold an immediate transaction on `conn`.
fn append_version(
    conn: &Connection,
    ctx: &EngineContext,
    document_id: &str,
    state: &FieldBag,
    editor: &str,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<VersionSnapshot> {
    let latest = versions::latest_version(conn, document_id)?;
    let snapshot = next_snapshot(
        latest.as_ref(),
        SnapshotRequest {
            document_id,
            state,
            editor,
            reason,
            now,
        },
        &ctx.config.diff_schema,
    );
    versions::insert_version(conn, &snapshot)?;
    tracing::debug!(
        document_id,
        version = snapshot.version,
        "version appended"
    );
    Ok(snapshot)
}

fn check_reason(ctx: &EngineContext, reason: Option<&str>) -> Result<()> {
    validate_reason(reason, ctx.config.max_reason_len).map_err(ExError::from)
}

/// Create a document with an initial state.
///
/// `document_id` defaults to a fresh UUIDv7. No version is recorded; the
/// first save becomes version 1.
///
/// # Errors
///
/// - `Validation` for a malformed field bag
/// - `AlreadyExists` if the id is taken
pub fn create_document(
    conn: &Connection,
    ctx: &EngineContext,
    document_id: Option<String>,
    state: FieldBag,
) -> Result<Document> {
    log_op_start!("create_document");
    let start = Instant::now();

    let result = create_document_impl(conn, ctx, document_id, state).map_err(|e| {
        log_op_error!("create_document", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "create_document",
        duration_ms = elapsed_ms(start),
        document_id = &result.id
    );

    Ok(result)
}

fn create_document_impl(
    conn: &Connection,
    ctx: &EngineContext,
    document_id: Option<String>,
    state: FieldBag,
) -> Result<Document> {
    validate_field_bag(&state, &ctx.config.diff_schema)?;
    let id = document_id.unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
    let document = Document::new(id, state, ctx.now());
    documents::insert_document(conn, &document)?;
    Ok(document)
}

/// # Errors
///
/// - `NotFound` if the document does not exist
pub fn load_document(conn: &Connection, document_id: &str) -> Result<Document> {
    log_op_start!("load_document", document_id = document_id);
    let start = Instant::now();

    let result = documents::load_document(conn, document_id).map_err(|e| {
        log_op_error!("load_document", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!("load_document", duration_ms = elapsed_ms(start));
    Ok(result)
}

/// Snapshot the document's current state as a new version.
///
/// Does not touch the document itself.
///
/// # Errors
///
/// - `Validation` if `reason` is too long
/// - `NotFound` if the document does not exist
/// - `Concurrency` if another writer took the version number first
pub fn create_version(
    conn: &mut Connection,
    ctx: &EngineContext,
    document_id: &str,
    editor: &str,
    reason: Option<&str>,
) -> Result<VersionSnapshot> {
    log_op_start!("create_version", document_id = document_id, actor_id = editor);
    let start = Instant::now();

    let result = create_version_impl(conn, ctx, document_id, editor, reason).map_err(|e| {
        log_op_error!("create_version", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "create_version",
        duration_ms = elapsed_ms(start),
        version = result.version
    );
    Ok(result)
}

fn create_version_impl(
    conn: &mut Connection,
    ctx: &EngineContext,
    document_id: &str,
    editor: &str,
    reason: Option<&str>,
) -> Result<VersionSnapshot> {
    check_reason(ctx, reason)?;
    let now = ctx.now();

    let tx = begin_immediate(conn)?;
    let document = documents::load_document(&tx, document_id)?;
    let snapshot = append_version(&tx, ctx, document_id, &document.state, editor, reason, now)?;
    tx.commit().map_err(from_rusqlite)?;

    ctx.invalidate_history(document_id);
    Ok(snapshot)
}

/// Save a new state on behalf of the lease holder.
///
/// Records the new state as the next version, overwrites the document and
/// clears the lease, all in one transaction.
///
/// # Errors
///
/// - `Validation` for a too-long reason or malformed state
/// - `Conflict` if another actor holds the lease
/// - `Forbidden` if nobody holds the lease
/// - `NotFound` if the document does not exist
pub fn save_with_version(
    conn: &mut Connection,
    ctx: &EngineContext,
    document_id: &str,
    actor_id: &str,
    state: FieldBag,
    reason: Option<&str>,
) -> Result<VersionSnapshot> {
    log_op_start!("save_with_version", document_id = document_id, actor_id = actor_id);
    let start = Instant::now();

    let result =
        save_with_version_impl(conn, ctx, document_id, actor_id, state, reason).map_err(|e| {
            log_op_error!("save_with_version", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

    log_op_end!(
        "save_with_version",
        duration_ms = elapsed_ms(start),
        version = result.version
    );
    Ok(result)
}

fn save_with_version_impl(
    conn: &mut Connection,
    ctx: &EngineContext,
    document_id: &str,
    actor_id: &str,
    state: FieldBag,
    reason: Option<&str>,
) -> Result<VersionSnapshot> {
    check_reason(ctx, reason)?;
    validate_field_bag(&state, &ctx.config.diff_schema)?;
    let now = ctx.now();

    let tx = begin_immediate(conn)?;
    let document = documents::load_document(&tx, document_id)?;
    match document.edit.holder() {
        Some((holder, _)) if holder == actor_id => {}
        Some((holder, since)) => {
            return Err(ExError::from(FolioError::LeaseConflict {
                document_id: document_id.to_string(),
                holder: holder.to_string(),
                since,
            })
            .with_op("save_with_version")
            .with_actor(actor_id));
        }
        None => {
            return Err(ExError::from(FolioError::LeaseNotHeld {
                document_id: document_id.to_string(),
                actor: actor_id.to_string(),
            })
            .with_op("save_with_version"));
        }
    }

    let snapshot = append_version(&tx, ctx, document_id, &state, actor_id, reason, now)?;
    documents::update_state(&tx, document_id, &state, now)?;
    documents::set_edit_state(&tx, document_id, &EditState::unlocked())?;
    tx.commit().map_err(from_rusqlite)?;

    ctx.invalidate_history(document_id);
    Ok(snapshot)
}

/// One page of history, newest first.
///
/// Served from the context's history cache when caching is enabled and a
/// fresh page is present.
///
/// # Errors
///
/// - `NotFound` if the document does not exist
pub fn get_history(
    conn: &Connection,
    ctx: &EngineContext,
    document_id: &str,
    limit: u64,
    offset: u64,
) -> Result<HistoryPage> {
    log_op_start!(
        "get_history",
        document_id = document_id,
        limit = limit,
        offset = offset
    );
    let start = Instant::now();

    let (result, cached) = get_history_impl(conn, ctx, document_id, limit, offset).map_err(|e| {
        log_op_error!("get_history", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "get_history",
        duration_ms = elapsed_ms(start),
        total = result.total,
        cached = cached
    );
    Ok(result)
}

fn get_history_impl(
    conn: &Connection,
    ctx: &EngineContext,
    document_id: &str,
    limit: u64,
    offset: u64,
) -> Result<(HistoryPage, bool)> {
    let cache = ctx.history_cache();
    if let Some(page) = cache.and_then(|cache| cache.get(document_id, limit, offset)) {
        return Ok((page, true));
    }
    let generation = cache.map(|cache| cache.generation(document_id));

    // One read transaction so the page and the total come from the same state.
    let tx = conn.unchecked_transaction().map_err(from_rusqlite)?;
    ensure_document_exists(&tx, document_id)?;
    let rows = versions::list_versions(&tx, document_id, limit, offset)?;
    let total = versions::count_versions(&tx, document_id)?;
    tx.commit().map_err(from_rusqlite)?;
    let page = HistoryPage::new(rows, offset, total);

    if let (Some(cache), Some(generation)) = (cache, generation) {
        cache.insert(document_id, limit, offset, generation, page.clone());
    }
    Ok((page, false))
}

fn ensure_document_exists(conn: &Connection, document_id: &str) -> Result<()> {
    match documents::find_document(conn, document_id)? {
        Some(_) => Ok(()),
        None => Err(ExError::from(FolioError::DocumentNotFound {
            document_id: document_id.to_string(),
        })),
    }
}

fn require_version(conn: &Connection, document_id: &str, version: u64) -> Result<VersionSnapshot> {
    versions::fetch_version(conn, document_id, version)?.ok_or_else(|| {
        ExError::from(FolioError::VersionNotFound {
            document_id: document_id.to_string(),
            version,
        })
    })
}

/// # Errors
///
/// - `NotFound` if the version does not exist
pub fn get_version(conn: &Connection, document_id: &str, version: u64) -> Result<VersionSnapshot> {
    log_op_start!("get_version", document_id = document_id, version = version);
    let start = Instant::now();

    let result = require_version(conn, document_id, version).map_err(|e| {
        log_op_error!("get_version", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!("get_version", duration_ms = elapsed_ms(start));
    Ok(result)
}

/// Diff two stored versions on demand. The result is not persisted.
///
/// # Errors
///
/// - `NotFound` if either version does not exist
pub fn compare_versions(
    conn: &Connection,
    ctx: &EngineContext,
    document_id: &str,
    from: u64,
    to: u64,
) -> Result<VersionDiff> {
    log_op_start!(
        "compare_versions",
        document_id = document_id,
        from = from,
        to = to
    );
    let start = Instant::now();

    let result = require_version(conn, document_id, from)
        .and_then(|old| Ok((old, require_version(conn, document_id, to)?)))
        .map(|(old, new)| compute_diff(Some(&old.snapshot), &new.snapshot, &ctx.config.diff_schema))
        .map_err(|e| {
            log_op_error!("compare_versions", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

    log_op_end!(
        "compare_versions",
        duration_ms = elapsed_ms(start),
        fields_changed = result.fields_changed.len() as u64
    );
    Ok(result)
}

/// # Errors
///
/// - `NotFound` if the document does not exist
pub fn count_versions(conn: &Connection, document_id: &str) -> Result<u64> {
    log_op_start!("count_versions", document_id = document_id);
    let start = Instant::now();

    let result = ensure_document_exists(conn, document_id)
        .and_then(|()| versions::count_versions(conn, document_id))
        .map_err(|e| {
            log_op_error!("count_versions", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

    log_op_end!("count_versions", duration_ms = elapsed_ms(start), total = result);
    Ok(result)
}

/// Restore a document to an earlier version.
///
/// Records the pre-restore state, copies the target snapshot over the
/// document verbatim, then records the restored state: two new versions,
/// one transaction. The lease is left as it was.
///
/// An admin may restore over another actor's live lease.
///
/// # Errors
///
/// - `Validation` if `reason` is too long
/// - `NotFound` if the document or target version does not exist
/// - `Conflict` if another actor holds an unexpired lease and the restorer
///   is not an admin
pub fn restore_version(
    conn: &mut Connection,
    ctx: &EngineContext,
    document_id: &str,
    target_version: u64,
    restorer: &Actor,
    reason: Option<&str>,
) -> Result<Document> {
    log_op_start!(
        "restore_version",
        document_id = document_id,
        version = target_version,
        actor_id = restorer.id.as_str()
    );
    let start = Instant::now();

    let result = restore_version_impl(conn, ctx, document_id, target_version, restorer, reason)
        .map_err(|e| {
            log_op_error!("restore_version", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

    log_op_end!("restore_version", duration_ms = elapsed_ms(start));
    Ok(result)
}

fn restore_version_impl(
    conn: &mut Connection,
    ctx: &EngineContext,
    document_id: &str,
    target_version: u64,
    restorer: &Actor,
    reason: Option<&str>,
) -> Result<Document> {
    check_reason(ctx, reason)?;
    let now = ctx.now();

    let tx = begin_immediate(conn)?;
    let mut document = documents::load_document(&tx, document_id)?;
    if let Some((holder, since)) = document.edit.holder() {
        let live = !is_expired(since, now, ctx.config.lease_timeout);
        if holder != restorer.id && live && !restorer.is_admin {
            return Err(ExError::from(FolioError::LeaseConflict {
                document_id: document_id.to_string(),
                holder: holder.to_string(),
                since,
            })
            .with_op("restore_version")
            .with_actor(restorer.id.clone()));
        }
    }
    let target = require_version(&tx, document_id, target_version)?;

    let before_reason = before_restore_reason(target_version);
    let before = append_version(
        &tx,
        ctx,
        document_id,
        &document.state,
        &restorer.id,
        Some(before_reason.as_str()),
        now,
    )?;

    documents::update_state(&tx, document_id, &target.snapshot, now)?;

    let after_reason = reason
        .map(str::to_string)
        .unwrap_or_else(|| after_restore_reason(target_version));
    let after = append_version(
        &tx,
        ctx,
        document_id,
        &target.snapshot,
        &restorer.id,
        Some(after_reason.as_str()),
        now,
    )?;
    tx.commit().map_err(from_rusqlite)?;

    ctx.invalidate_history(document_id);
    ctx.notify(ChangeEvent::VersionRestored {
        document_id: document_id.to_string(),
        restored_from: target_version,
        before_version: before.version,
        after_version: after.version,
        restored_by: restorer.id.clone(),
    });

    document.state = target.snapshot;
    document.updated_at = now;
    Ok(document)
}
