//! Change notification seam.
//!
//! Delivery is best-effort: the engine calls `notify` after its transaction
//! commits and logs, then discards, any error.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::ExError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// An acquire was refused because another actor holds the lease
    LeaseConflict {
        document_id: String,
        requested_by: String,
        holder: String,
        since: DateTime<Utc>,
    },
    /// An abandoned lease was taken over
    LeaseReclaimed {
        document_id: String,
        previous_holder: String,
        new_holder: String,
    },
    VersionRestored {
        document_id: String,
        restored_from: u64,
        /// Version capturing the state before the restore
        before_version: u64,
        /// Version capturing the restored state
        after_version: u64,
        restored_by: String,
    },
}

impl ChangeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeEvent::LeaseConflict { .. } => "lease_conflict",
            ChangeEvent::LeaseReclaimed { .. } => "lease_reclaimed",
            ChangeEvent::VersionRestored { .. } => "version_restored",
        }
    }

    pub fn document_id(&self) -> &str {
        match self {
            ChangeEvent::LeaseConflict { document_id, .. }
            | ChangeEvent::LeaseReclaimed { document_id, .. }
            | ChangeEvent::VersionRestored { document_id, .. } => document_id,
        }
    }
}

#[allow(clippy::result_large_err)]
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, event: &ChangeEvent) -> Result<(), ExError>;
}

/// Drops every event.
pub struct NoopChangeNotifier;

impl ChangeNotifier for NoopChangeNotifier {
    fn notify(&self, _: &ChangeEvent) -> Result<(), ExError> {
        Ok(())
    }
}

/// Emits every event as an info-level log line.
pub struct TracingChangeNotifier;

impl ChangeNotifier for TracingChangeNotifier {
    fn notify(&self, event: &ChangeEvent) -> Result<(), ExError> {
        let payload = serde_json::to_string(event).unwrap_or_default();
        tracing::info!(
            notification = event.name(),
            document_id = event.document_id(),
            payload = %payload,
            "change notification"
        );
        Ok(())
    }
}
