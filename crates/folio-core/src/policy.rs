//! Access policy seam.
//!
//! The versioning core itself only distinguishes lease holder and admin.
//! Whether an actor may edit a document at all (author, owner, admin) is
//! decided by the caller's layer through this trait before any lease or
//! version operation runs.

use crate::model::Actor;

pub trait AccessPolicy: Send + Sync {
    fn can_edit(&self, actor: &Actor, document_id: &str) -> bool;
}

/// Allows everyone. Suitable when authorization happens further out.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllAccessPolicy;

impl AccessPolicy for AllowAllAccessPolicy {
    fn can_edit(&self, _: &Actor, _: &str) -> bool {
        true
    }
}

/// Only admins may edit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminOnlyAccessPolicy;

impl AccessPolicy for AdminOnlyAccessPolicy {
    fn can_edit(&self, actor: &Actor, _: &str) -> bool {
        actor.is_admin
    }
}
