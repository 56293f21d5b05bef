use crate::types::DbId;

/// Errors returned by [`crate::service::AuthService`].
///
/// Messages are safe to surface: none of them carries a token, a token
/// digest, a password or a password hash. Ambiguous authentication
/// outcomes are collapsed into [`CoreError::InvalidCredentials`] (login) and
/// [`CoreError::Unauthorized`] (token resolution) before they get here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Unknown email or wrong password. The two cases are indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Absent, expired or revoked session. The cases are indistinguishable.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("A user with this email already exists")]
    AlreadyExists,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Repeated session token collisions. Should never happen with 256-bit tokens.
    #[error("Session token collision")]
    DuplicateToken,

    #[error("Password hashing failed")]
    HashingFailure,

    #[error("Secure random source unavailable")]
    EntropyUnavailable,

    /// A user directory or session store backend failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<crate::ports::DirectoryError> for CoreError {
    fn from(err: crate::ports::DirectoryError) -> Self {
        match err {
            crate::ports::DirectoryError::EmailTaken => CoreError::AlreadyExists,
            crate::ports::DirectoryError::Backend(msg) => CoreError::Storage(msg),
        }
    }
}
