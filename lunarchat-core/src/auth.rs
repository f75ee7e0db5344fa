//! Authentication snapshot consumed by the session coordinator
//!
//! The coordinator never reads ambient global state; login and logout
//! produce a new [`AuthSnapshot`] value and every gated operation checks
//! the snapshot it was given.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Role granted at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub username: String,
    pub role: UserRole,
}

/// Point-in-time view of who, if anyone, is logged in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    user: Option<AuthUser>,
}

impl AuthSnapshot {
    /// Snapshot with nobody logged in
    pub fn unauthenticated() -> Self {
        Self { user: None }
    }

    /// Snapshot for a successful login
    pub fn authenticated(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Gate check for a mutating action; `action` names the rejected
    /// operation in the error.
    pub fn require(&self, action: &str) -> Result<&AuthUser> {
        self.user
            .as_ref()
            .ok_or_else(|| Error::Unauthenticated(action.to_string()))
    }
}
