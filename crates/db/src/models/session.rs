//! User session row model and DTOs.

use sqlx::FromRow;
use uuid::Uuid;
use warden_core::models::{Session, SessionUser};
use warden_core::token::TokenHash;
use warden_core::types::{DbId, Timestamp};

/// A `user_sessions` row joined with its owner's name and email.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: DbId,
    pub user_name: String,
    pub user_email: String,
    pub token_hash: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            user: SessionUser {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
            token_hash: TokenHash::from_stored(row.token_hash),
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
            user_agent: row.user_agent,
            ip_address: row.ip_address,
        }
    }
}

/// DTO for inserting a session row.
pub struct CreateSession<'a> {
    pub id: Uuid,
    pub user_id: DbId,
    pub token_hash: &'a str,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub user_agent: Option<&'a str>,
    pub ip_address: Option<&'a str>,
}
