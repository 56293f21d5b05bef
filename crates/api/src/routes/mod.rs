pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                 login (public)
/// /auth/me                    current user (requires auth)
/// /auth/sessions              live sessions of the caller (requires auth)
/// /auth/logout                revoke this session (requires auth)
/// /auth/logout-all            revoke every session of the caller (requires auth)
///
/// /users                      register (public), list (requires auth)
/// /users/{id}                 get (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
}
