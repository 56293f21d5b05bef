//! Credential verification and session lifecycle.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`token`] -- opaque session tokens and their SHA-256 digests.
//! - [`ports`] -- the user directory and session store contracts.
//! - [`memory`] -- in-memory implementations of those contracts.
//! - [`service`] -- [`service::AuthService`], which ties them together.

pub mod clock;
pub mod error;
pub mod memory;
pub mod models;
pub mod password;
pub mod ports;
pub mod service;
pub mod token;
pub mod types;
