//! In-memory implementations of the collaborator traits.
//!
//! Used by tests and by the API binary when no `DATABASE_URL` is configured.
//! Each type owns a single `tokio::sync::RwLock`; callers never lock.

mod sessions;
mod users;

pub use sessions::InMemorySessionStore;
pub use users::InMemoryUserDirectory;
