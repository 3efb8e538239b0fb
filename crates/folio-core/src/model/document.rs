use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field::FieldBag;

/// The edit lease projection stored on the document record.
///
/// `locked == false` implies `locked_by` and `locked_at` are both `None`;
/// the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EditState {
    pub locked: bool,
    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
}

impl EditState {
    pub fn unlocked() -> Self {
        Self::default()
    }

    pub fn locked(holder: impl Into<String>, since: DateTime<Utc>) -> Self {
        Self {
            locked: true,
            locked_by: Some(holder.into()),
            locked_at: Some(since),
        }
    }

    /// Rebuild from the three denormalized columns, rejecting combinations
    /// that break the lock invariant.
    pub fn from_parts(
        locked: bool,
        locked_by: Option<String>,
        locked_at: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        match (locked, locked_by, locked_at) {
            (false, None, None) => Some(Self::unlocked()),
            (true, Some(holder), Some(since)) => Some(Self::locked(holder, since)),
            _ => None,
        }
    }

    /// Current holder and grant time, if locked
    pub fn holder(&self) -> Option<(&str, DateTime<Utc>)> {
        match (&self.locked_by, self.locked_at) {
            (Some(holder), Some(since)) if self.locked => Some((holder.as_str(), since)),
            _ => None,
        }
    }
}

/// A document as seen by the versioning core: an id, the opaque state bag,
/// and the edit lease fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub state: FieldBag,
    pub edit: EditState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: String, state: FieldBag, now: DateTime<Utc>) -> Self {
        Self {
            id,
            state,
            edit: EditState::unlocked(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The caller on whose behalf an operation runs.
///
/// Authentication happens upstream; `is_admin` only matters for lease
/// release overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }
}
