//! Domain records shared by the service, the stores and the HTTP layer.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::token::{SessionToken, TokenHash};
use crate::types::{DbId, Timestamp};

/// Canonical form of an email address: trimmed and lowercased.
///
/// Directory lookups and uniqueness are both defined over this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Full user record as held by the user directory.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserProfile`] for external-facing output.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: Timestamp,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Safe user representation (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub created_at: Timestamp,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// DTO for inserting a user into the directory.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    /// Already normalized with [`normalize_email`].
    pub email: String,
    pub password_hash: String,
}

/// Session owner, denormalized onto the session for cheap display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Lifecycle state of a session at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Expired,
    Revoked,
}

/// One authenticated client context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user: SessionUser,
    pub token_hash: TokenHash,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl Session {
    /// Revocation wins over expiry; expiry is inclusive of `expires_at`.
    pub fn state_at(&self, now: Timestamp) -> SessionState {
        if self.revoked_at.is_some() {
            SessionState::Revoked
        } else if now >= self.expires_at {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }

    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.state_at(now) == SessionState::Active
    }
}

/// DTO for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user: SessionUser,
    pub token_hash: TokenHash,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Client metadata recorded with a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// A freshly issued raw token and its expiry. Returned exactly once.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: SessionToken,
    pub expires_at: Timestamp,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub session: IssuedToken,
}
