//! Caller-layer command dispatch with access policy and request correlation.

#![allow(clippy::result_large_err)]

use crate::commands::lease::{acquire_lease, release_lease, AcquireOutcome, ReleaseOutcome};
use crate::commands::version::{restore_version, save_with_version};
use crate::EngineContext;
use folio_core::errors::{ExError, ExErrorKind};
use folio_core::model::{Actor, Document, FieldBag, VersionSnapshot};
use folio_core::policy::AccessPolicy;
use folio_core_types::RequestContext;
use folio_store::errors::Result;
use rusqlite::Connection;

/// Mutating commands an inbound request can issue.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    AcquireLease {
        document_id: String,
        actor: Actor,
    },
    /// Holder/admin rules apply; the access policy is not consulted.
    ReleaseLease {
        document_id: String,
        actor: Actor,
    },
    SaveWithVersion {
        document_id: String,
        actor: Actor,
        state: FieldBag,
        reason: Option<String>,
    },
    RestoreVersion {
        document_id: String,
        actor: Actor,
        version: u64,
        reason: Option<String>,
    },
}

impl EngineCommand {
    fn document_id(&self) -> &str {
        match self {
            EngineCommand::AcquireLease { document_id, .. }
            | EngineCommand::ReleaseLease { document_id, .. }
            | EngineCommand::SaveWithVersion { document_id, .. }
            | EngineCommand::RestoreVersion { document_id, .. } => document_id,
        }
    }

    fn actor(&self) -> &Actor {
        match self {
            EngineCommand::AcquireLease { actor, .. }
            | EngineCommand::ReleaseLease { actor, .. }
            | EngineCommand::SaveWithVersion { actor, .. }
            | EngineCommand::RestoreVersion { actor, .. } => actor,
        }
    }

    fn requires_edit_access(&self) -> bool {
        !matches!(self, EngineCommand::ReleaseLease { .. })
    }
}

#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Lease(AcquireOutcome),
    Released(ReleaseOutcome),
    Saved(VersionSnapshot),
    Restored(Document),
}

/// Apply a command after checking the access policy.
///
/// Errors carry the request's correlation ids.
///
/// # Errors
///
/// - `Forbidden` if the policy denies the actor edit access
/// - any error of the underlying command
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    ctx: &EngineContext,
    policy: &dyn AccessPolicy,
    request: &RequestContext,
) -> Result<EngineCommandResult> {
    apply(cmd, conn, ctx, policy).map_err(|e| {
        let e = e.with_request_id(request.request_id.clone());
        match &request.trace_id {
            Some(trace_id) => e.with_trace_id(trace_id.clone()),
            None => e,
        }
    })
}

fn apply(
    cmd: EngineCommand,
    conn: &mut Connection,
    ctx: &EngineContext,
    policy: &dyn AccessPolicy,
) -> Result<EngineCommandResult> {
    if cmd.requires_edit_access() && !policy.can_edit(cmd.actor(), cmd.document_id()) {
        return Err(ExError::new(ExErrorKind::Forbidden)
            .with_op("apply_engine_command")
            .with_document_id(cmd.document_id())
            .with_actor(cmd.actor().id.clone())
            .with_message("Actor may not edit this document"));
    }

    match cmd {
        EngineCommand::AcquireLease { document_id, actor } => {
            acquire_lease(conn, ctx, &document_id, &actor.id).map(EngineCommandResult::Lease)
        }
        EngineCommand::ReleaseLease { document_id, actor } => {
            release_lease(conn, &document_id, &actor).map(EngineCommandResult::Released)
        }
        EngineCommand::SaveWithVersion {
            document_id,
            actor,
            state,
            reason,
        } => save_with_version(conn, ctx, &document_id, &actor.id, state, reason.as_deref())
            .map(EngineCommandResult::Saved),
        EngineCommand::RestoreVersion {
            document_id,
            actor,
            version,
            reason,
        } => restore_version(conn, ctx, &document_id, version, &actor, reason.as_deref())
            .map(EngineCommandResult::Restored),
    }
}
