use std::sync::Arc;

use warden_core::service::AuthService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Credential verification and session lifecycle.
    pub auth: Arc<AuthService>,
    /// Server configuration (cookie policy is read by the auth handlers).
    pub config: Arc<ServerConfig>,
}
