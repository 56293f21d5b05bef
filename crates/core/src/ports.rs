//! Collaborator contracts consumed by [`crate::service::AuthService`].
//!
//! Both traits are object safe and used as `Arc<dyn ...>` so the backend
//! (in-memory or PostgreSQL) is chosen once at composition time.

use async_trait::async_trait;

use crate::models::{NewSession, NewUser, Session, User};
use crate::token::TokenHash;
use crate::types::DbId;

/// Result type for session store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Session store failures.
///
/// `NotFound`, `Expired` and `Revoked` are diagnostics for the service; they
/// are collapsed into a single `Unauthorized` before leaving it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("Session revoked")]
    Revoked,

    #[error("Session token digest already exists")]
    DuplicateToken,

    #[error("Session backend error: {0}")]
    Backend(String),
}

/// User directory failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The directory's uniqueness constraint on email rejected an insert.
    #[error("Email already registered")]
    EmailTaken,

    #[error("Directory backend error: {0}")]
    Backend(String),
}

/// Lookup and registration of user identities.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, DirectoryError>;

    /// All users, most recently created first.
    async fn list(&self) -> Result<Vec<User>, DirectoryError>;

    /// Insert a user. Must fail with [`DirectoryError::EmailTaken`] when the
    /// email is already present, even under concurrent inserts.
    async fn insert(&self, input: &NewUser) -> Result<User, DirectoryError>;
}

/// Keyed storage of sessions by token digest.
///
/// Every mutation is atomic with respect to concurrent reads of the same key.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session. Fails with [`StoreError::DuplicateToken`] if the
    /// digest is already present.
    async fn create_session(&self, input: NewSession) -> StoreResult<Session>;

    /// Resolve a live session.
    ///
    /// Expired records are removed on this path before `Expired` is returned.
    async fn get_session_by_token_hash(&self, hash: &TokenHash) -> StoreResult<Session>;

    /// Mark a session revoked. Idempotent; absent sessions are not an error.
    async fn revoke_session_by_token_hash(&self, hash: &TokenHash) -> StoreResult<()>;

    /// Revoke every live session of a user. Returns how many were revoked.
    async fn revoke_all_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64>;

    /// Sessions of a user that are neither expired nor revoked, newest first.
    async fn list_active_sessions_for_user(&self, user_id: DbId) -> StoreResult<Vec<Session>>;

    /// Delete expired and revoked sessions. Returns the count of deleted records.
    async fn purge_expired(&self) -> StoreResult<u64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
