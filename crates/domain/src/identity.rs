use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;

/// The principal a request runs as. Threaded explicitly through every
/// operation; there is no ambient current-viewer lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(String),
}

impl Viewer {
    pub fn user(user_id: impl Into<String>) -> Self {
        Viewer::User(user_id.into())
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(user_id) => Some(user_id),
        }
    }

    /// Mutating operations require an authenticated viewer.
    pub fn require_user(&self) -> DomainResult<&str> {
        self.user_id()
            .ok_or_else(|| DomainError::Forbidden("authentication required".to_string()))
    }
}

/// Denormalized copy of a user's display identity, embedded in posts,
/// user-tags and comments. Equality and hashing are id-only on purpose:
/// two snapshots with stale name/avatar fields still refer to the same
/// user, which is what makes remove-then-reinsert a replace for sets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: String,
    pub username: String,
    pub avatar_url: String,
}

impl UserSnapshot {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar_url: avatar_url.into(),
        }
    }

    pub fn of(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

impl PartialEq for UserSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UserSnapshot {}

impl Hash for UserSnapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// User record as mirrored from the identity store. The relation sets are
/// independent: block and follow may coexist toward the same target, and
/// the visibility resolver gives block priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub avatar_url: String,
    pub public_account: bool,
    pub following: HashSet<String>,
    pub blocked: HashSet<String>,
    pub muted: HashSet<String>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        avatar_url: impl Into<String>,
        public_account: bool,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar_url: avatar_url.into(),
            public_account,
            following: HashSet::new(),
            blocked: HashSet::new(),
            muted: HashSet::new(),
        }
    }
}
