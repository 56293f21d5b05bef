//! `warden_core::ports` implementations backed by PostgreSQL.
//!
//! Driver errors never leave this module raw: uniqueness violations become
//! the typed port errors, everything else becomes a `Backend` message.
//! Nothing is retried here; retry policy belongs to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;
use warden_core::clock::Clock;
use warden_core::models::{NewSession, NewUser, Session, SessionState, User};
use warden_core::ports::{DirectoryError, SessionStore, StoreError, StoreResult, UserDirectory};
use warden_core::token::TokenHash;
use warden_core::types::DbId;

use crate::models::session::CreateSession;
use crate::repositories::{SessionRepo, UserRepo};
use crate::{is_unique_violation, DbPool};

fn directory_error(err: sqlx::Error) -> DirectoryError {
    if is_unique_violation(&err) {
        return DirectoryError::EmailTaken;
    }
    tracing::error!(error = %err, "User directory query failed");
    DirectoryError::Backend(err.to_string())
}

fn store_error(err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::DuplicateToken;
    }
    tracing::error!(error = %err, "Session store query failed");
    StoreError::Backend(err.to_string())
}

/// User directory over the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: DbPool,
}

impl PgUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let row = UserRepo::find_by_email(&self.pool, email)
            .await
            .map_err(directory_error)?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, DirectoryError> {
        let row = UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(directory_error)?;
        Ok(row.map(User::from))
    }

    async fn list(&self) -> Result<Vec<User>, DirectoryError> {
        let rows = UserRepo::list(&self.pool).await.map_err(directory_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn insert(&self, input: &NewUser) -> Result<User, DirectoryError> {
        let row = UserRepo::create(&self.pool, &input.name, &input.email, &input.password_hash)
            .await
            .map_err(directory_error)?;
        Ok(row.into())
    }
}

/// Session store over the `user_sessions` table.
///
/// Each mutation is one SQL statement, so concurrent readers see a session
/// either fully written or not at all.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl PgSessionStore {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create_session(&self, input: NewSession) -> StoreResult<Session> {
        let id = Uuid::new_v4();
        SessionRepo::create(
            &self.pool,
            &CreateSession {
                id,
                user_id: input.user.id,
                token_hash: input.token_hash.as_str(),
                created_at: input.created_at,
                expires_at: input.expires_at,
                user_agent: input.user_agent.as_deref(),
                ip_address: input.ip_address.as_deref(),
            },
        )
        .await
        .map_err(store_error)?;

        Ok(Session {
            id,
            user: input.user,
            token_hash: input.token_hash,
            created_at: input.created_at,
            expires_at: input.expires_at,
            revoked_at: None,
            user_agent: input.user_agent,
            ip_address: input.ip_address,
        })
    }

    async fn get_session_by_token_hash(&self, hash: &TokenHash) -> StoreResult<Session> {
        let session: Session = SessionRepo::find_by_token_hash(&self.pool, hash.as_str())
            .await
            .map_err(store_error)?
            .ok_or(StoreError::NotFound)?
            .into();

        match session.state_at(self.clock.now()) {
            SessionState::Active => Ok(session),
            SessionState::Revoked => Err(StoreError::Revoked),
            SessionState::Expired => {
                SessionRepo::delete(&self.pool, session.id)
                    .await
                    .map_err(store_error)?;
                Err(StoreError::Expired)
            }
        }
    }

    async fn revoke_session_by_token_hash(&self, hash: &TokenHash) -> StoreResult<()> {
        SessionRepo::revoke_by_token_hash(&self.pool, hash.as_str(), self.clock.now())
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn revoke_all_sessions_for_user(&self, user_id: DbId) -> StoreResult<u64> {
        SessionRepo::revoke_all_for_user(&self.pool, user_id, self.clock.now())
            .await
            .map_err(store_error)
    }

    async fn list_active_sessions_for_user(&self, user_id: DbId) -> StoreResult<Vec<Session>> {
        let rows = SessionRepo::list_active_for_user(&self.pool, user_id, self.clock.now())
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        SessionRepo::cleanup_expired(&self.pool, self.clock.now())
            .await
            .map_err(store_error)
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await.map_err(store_error)
    }
}
