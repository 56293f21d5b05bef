//! User row model.

use sqlx::FromRow;
use warden_core::models::User;
use warden_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
#[derive(Clone, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: Timestamp,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}
