//! Edit lease commands with boundary logging.
//!
//! Every command reads and writes the lease columns inside one immediate
//! transaction, so two acquires for the same document are serialized by
//! SQLite's write lock and at most one of them can be granted.
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for lease operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use folio_core::errors::{ExError, FolioError};
use folio_core::lease::{self, AcquireDecision, LeaseStatus, ReleaseDecision};
use folio_core::model::{Actor, EditState};
use folio_core::notifier::ChangeEvent;
use folio_core::{log_op_end, log_op_error, log_op_start};
use folio_store::db::begin_immediate;
use folio_store::errors::{from_rusqlite, Result};
use folio_store::repo::documents;
use rusqlite::Connection;
use serde::Serialize;
use std::time::Instant;

/// Result of an acquire attempt. A conflict is an outcome, not an error:
/// the caller is told who holds the document and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AcquireOutcome {
    Granted {
        holder: String,
        since: DateTime<Utc>,
        /// Previous holder whose expired lease was taken over
        #[serde(skip_serializing_if = "Option::is_none")]
        reclaimed_from: Option<String>,
    },
    Conflict {
        holder: String,
        since: DateTime<Utc>,
    },
}

impl AcquireOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, AcquireOutcome::Granted { .. })
    }

    pub fn holder(&self) -> &str {
        match self {
            AcquireOutcome::Granted { holder, .. } | AcquireOutcome::Conflict { holder, .. } => {
                holder
            }
        }
    }

    /// Turn a conflict into the `Conflict` error for callers that cannot
    /// proceed without the lease.
    pub fn into_result(self, document_id: &str) -> Result<AcquireOutcome> {
        match self {
            AcquireOutcome::Conflict { holder, since } => Err(ExError::from(
                FolioError::LeaseConflict {
                    document_id: document_id.to_string(),
                    holder,
                    since,
                },
            )
            .with_op("acquire_lease")),
            granted => Ok(granted),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseOutcome {
    pub released: bool,
    pub previous_holder: Option<String>,
    /// An admin released someone else's lease
    pub overridden: bool,
}

/// Acquire the edit lease on a document.
///
/// Idempotent for the current holder. A lease older than the configured
/// timeout is reclaimed by the requester.
///
/// # Errors
///
/// - `NotFound` if the document does not exist
/// - `Persistence` / `Concurrency` on store failure
pub fn acquire_lease(
    conn: &mut Connection,
    ctx: &crate::EngineContext,
    document_id: &str,
    actor_id: &str,
) -> Result<AcquireOutcome> {
    log_op_start!("acquire_lease", document_id = document_id, actor_id = actor_id);
    let start = Instant::now();

    let result = acquire_lease_impl(conn, ctx, document_id, actor_id).map_err(|e| {
        log_op_error!(
            "acquire_lease",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "acquire_lease",
        duration_ms = start.elapsed().as_millis() as u64,
        granted = result.is_granted(),
        holder = result.holder()
    );

    Ok(result)
}

fn acquire_lease_impl(
    conn: &mut Connection,
    ctx: &crate::EngineContext,
    document_id: &str,
    actor_id: &str,
) -> Result<AcquireOutcome> {
    let now = ctx.now();
    let tx = begin_immediate(conn)?;
    let document = documents::load_document(&tx, document_id)?;

    let decision = lease::decide_acquire(&document.edit, actor_id, now, ctx.config.lease_timeout);
    if let Some(next) = decision.next_state(actor_id) {
        documents::set_edit_state(&tx, document_id, &next)?;
    }
    tx.commit().map_err(from_rusqlite)?;

    let outcome = match decision {
        AcquireDecision::Grant { since } | AcquireDecision::AlreadyHeld { since } => {
            AcquireOutcome::Granted {
                holder: actor_id.to_string(),
                since,
                reclaimed_from: None,
            }
        }
        AcquireDecision::Reclaim {
            previous_holder,
            since,
            ..
        } => {
            ctx.notify(ChangeEvent::LeaseReclaimed {
                document_id: document_id.to_string(),
                previous_holder: previous_holder.clone(),
                new_holder: actor_id.to_string(),
            });
            AcquireOutcome::Granted {
                holder: actor_id.to_string(),
                since,
                reclaimed_from: Some(previous_holder),
            }
        }
        AcquireDecision::Conflict { holder, since } => {
            ctx.notify(ChangeEvent::LeaseConflict {
                document_id: document_id.to_string(),
                requested_by: actor_id.to_string(),
                holder: holder.clone(),
                since,
            });
            AcquireOutcome::Conflict { holder, since }
        }
    };

    Ok(outcome)
}

/// Release the edit lease.
///
/// A no-op on an unlocked document. Only the holder or an admin may release.
///
/// # Errors
///
/// - `Forbidden` if the actor is neither holder nor admin; the lease is untouched
/// - `NotFound` if the document does not exist
pub fn release_lease(
    conn: &mut Connection,
    document_id: &str,
    actor: &Actor,
) -> Result<ReleaseOutcome> {
    log_op_start!("release_lease", document_id = document_id, actor_id = &actor.id);
    let start = Instant::now();

    let result = release_lease_impl(conn, document_id, actor).map_err(|e| {
        log_op_error!(
            "release_lease",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "release_lease",
        duration_ms = start.elapsed().as_millis() as u64,
        released = result.released,
        overridden = result.overridden
    );

    Ok(result)
}

fn release_lease_impl(
    conn: &mut Connection,
    document_id: &str,
    actor: &Actor,
) -> Result<ReleaseOutcome> {
    let tx = begin_immediate(conn)?;
    let document = documents::load_document(&tx, document_id)?;

    let outcome = match lease::decide_release(&document.edit, actor) {
        ReleaseDecision::NotLocked => ReleaseOutcome {
            released: true,
            previous_holder: None,
            overridden: false,
        },
        ReleaseDecision::Release { holder, overridden } => {
            documents::set_edit_state(&tx, document_id, &EditState::unlocked())?;
            ReleaseOutcome {
                released: true,
                previous_holder: Some(holder),
                overridden,
            }
        }
        ReleaseDecision::Forbidden { holder } => {
            return Err(ExError::from(FolioError::ReleaseForbidden {
                document_id: document_id.to_string(),
                actor: actor.id.clone(),
                holder,
            })
            .with_op("release_lease"));
        }
    };

    tx.commit().map_err(from_rusqlite)?;
    Ok(outcome)
}

/// Read-only lease projection. Never mutates, even when the lease has expired.
pub fn lease_status(
    conn: &Connection,
    ctx: &crate::EngineContext,
    document_id: &str,
) -> Result<LeaseStatus> {
    log_op_start!("lease_status", document_id = document_id);
    let start = Instant::now();

    let result = documents::load_document(conn, document_id)
        .map(|doc| LeaseStatus::project(&doc.edit, ctx.now(), ctx.config.lease_timeout))
        .map_err(|e| {
            log_op_error!(
                "lease_status",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "lease_status",
        duration_ms = start.elapsed().as_millis() as u64,
        locked = result.locked
    );

    Ok(result)
}
