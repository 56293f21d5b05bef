//! Repository layer providing SQL operations for each table.

pub mod session_repo;
pub mod user_repo;

pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
