//! Edit lease state machine.
//!
//! Pure decision functions over an [`EditState`]. They never touch storage;
//! the engine applies the decision inside the same write transaction in
//! which it read the state, which is what makes the lease exclusive.
//!
//! ```text
//! Unlocked ──acquire(a)──▶ Locked(a, now)
//! Locked(a, t) ──acquire(a)──▶ Locked(a, t)            idempotent
//! Locked(a, t) ──acquire(b), now - t > timeout──▶ Locked(b, now)
//! Locked(a, t) ──acquire(b)──▶ Conflict{a, t}
//! Locked(a, _) ──release(a | admin)──▶ Unlocked
//! ```
//!
//! Expiry is evaluated lazily at acquire time; there is no sweeper.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Actor, EditState};

/// Lease age after which another actor may reclaim the document
pub const DEFAULT_LEASE_TIMEOUT_MINUTES: i64 = 30;

pub fn default_lease_timeout() -> Duration {
    Duration::minutes(DEFAULT_LEASE_TIMEOUT_MINUTES)
}

/// Outcome of an acquire attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireDecision {
    /// Lease granted to a document nobody held
    Grant { since: DateTime<Utc> },
    /// Requester already holds the lease; the original grant time stands
    AlreadyHeld { since: DateTime<Utc> },
    /// Previous holder's lease aged past the timeout and is taken over
    Reclaim {
        previous_holder: String,
        previous_since: DateTime<Utc>,
        since: DateTime<Utc>,
    },
    /// Someone else holds a live lease
    Conflict {
        holder: String,
        since: DateTime<Utc>,
    },
}

impl AcquireDecision {
    pub fn is_granted(&self) -> bool {
        !matches!(self, AcquireDecision::Conflict { .. })
    }

    /// Edit state to persist, if the decision changes it
    pub fn next_state(&self, actor_id: &str) -> Option<EditState> {
        match self {
            AcquireDecision::Grant { since } | AcquireDecision::Reclaim { since, .. } => {
                Some(EditState::locked(actor_id, *since))
            }
            AcquireDecision::AlreadyHeld { .. } | AcquireDecision::Conflict { .. } => None,
        }
    }
}

/// Outcome of a release attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseDecision {
    /// Nothing to release
    NotLocked,
    /// Lease cleared; `overridden` is true when an admin released someone else's lease
    Release { holder: String, overridden: bool },
    Forbidden { holder: String },
}

/// Whether a lease granted at `since` has aged past `timeout` at `now`
pub fn is_expired(since: DateTime<Utc>, now: DateTime<Utc>, timeout: Duration) -> bool {
    now - since > timeout
}

pub fn decide_acquire(
    state: &EditState,
    actor_id: &str,
    now: DateTime<Utc>,
    timeout: Duration,
) -> AcquireDecision {
    match state.holder() {
        None => AcquireDecision::Grant { since: now },
        Some((holder, since)) if holder == actor_id => AcquireDecision::AlreadyHeld { since },
        Some((holder, since)) if is_expired(since, now, timeout) => AcquireDecision::Reclaim {
            previous_holder: holder.to_string(),
            previous_since: since,
            since: now,
        },
        Some((holder, since)) => AcquireDecision::Conflict {
            holder: holder.to_string(),
            since,
        },
    }
}

pub fn decide_release(state: &EditState, actor: &Actor) -> ReleaseDecision {
    match state.holder() {
        None => ReleaseDecision::NotLocked,
        Some((holder, _)) if holder == actor.id => ReleaseDecision::Release {
            holder: holder.to_string(),
            overridden: false,
        },
        Some((holder, _)) if actor.is_admin => ReleaseDecision::Release {
            holder: holder.to_string(),
            overridden: true,
        },
        Some((holder, _)) => ReleaseDecision::Forbidden {
            holder: holder.to_string(),
        },
    }
}

/// Read-only view of a document's lease, safe to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseStatus {
    pub locked: bool,
    pub holder: Option<String>,
    pub since: Option<DateTime<Utc>>,
    /// `None` when unlocked, or when the timeout runs past the representable range
    pub expires_at: Option<DateTime<Utc>>,
    /// Held, but past the timeout: the next acquire by anyone will reclaim it
    pub expired: bool,
}

impl LeaseStatus {
    pub fn project(state: &EditState, now: DateTime<Utc>, timeout: Duration) -> Self {
        match state.holder() {
            None => Self {
                locked: false,
                holder: None,
                since: None,
                expires_at: None,
                expired: false,
            },
            Some((holder, since)) => Self {
                locked: true,
                holder: Some(holder.to_string()),
                since: Some(since),
                expires_at: since.checked_add_signed(timeout),
                expired: is_expired(since, now, timeout),
            },
        }
    }
}
