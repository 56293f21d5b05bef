//! Request extractors shared by the handlers.
//!
//! - [`auth::AuthUser`] -- Resolves the session behind a Bearer token or the session cookie.
//! - [`client_info::ClientMeta`] -- Captures user agent and client IP for new sessions.

pub mod auth;
pub mod client_info;
