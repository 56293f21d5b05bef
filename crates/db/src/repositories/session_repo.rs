//! Repository for the `user_sessions` table.

use sqlx::PgPool;
use uuid::Uuid;
use warden_core::types::{DbId, Timestamp};

use crate::models::session::{CreateSession, SessionRow};

/// Session columns joined with the owner's display fields.
const JOINED_COLUMNS: &str = "s.id, s.user_id, u.name AS user_name, u.email AS user_email, \
                              s.token_hash, s.created_at, s.expires_at, s.revoked_at, \
                              s.user_agent, s.ip_address";

/// Provides CRUD operations for user sessions.
///
/// "Now" is always passed in by the caller so expiry follows the
/// application clock rather than the database's `NOW()`.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session in a single statement.
    ///
    /// Fails with a unique violation on `uq_user_sessions_token_hash` if the
    /// digest already exists.
    pub async fn create(pool: &PgPool, input: &CreateSession<'_>) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_sessions
                (id, user_id, token_hash, created_at, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(input.id)
        .bind(input.user_id)
        .bind(input.token_hash)
        .bind(input.created_at)
        .bind(input.expires_at)
        .bind(input.user_agent)
        .bind(input.ip_address)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a session by token digest, regardless of its state.
    pub async fn find_by_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM user_sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = $1"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// List sessions of a user that are neither revoked nor expired at `now`.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<SessionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM user_sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.user_id = $1
               AND s.revoked_at IS NULL
               AND s.expires_at > $2
             ORDER BY s.created_at DESC"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Revoke a single session by digest. Returns `true` if the row was updated.
    pub async fn revoke_by_token_hash(
        pool: &PgPool,
        hash: &str,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = $2
             WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(hash)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke all live sessions for a user. Returns the count of revoked sessions.
    pub async fn revoke_all_for_user(
        pool: &PgPool,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = $2
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2",
        )
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete one session by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete expired or revoked sessions. Returns the count of deleted rows.
    pub async fn cleanup_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_sessions WHERE expires_at <= $1 OR revoked_at IS NOT NULL",
        )
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
