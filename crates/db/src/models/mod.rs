//! Row types for the `users` and `user_sessions` tables.

pub mod session;
pub mod user;
