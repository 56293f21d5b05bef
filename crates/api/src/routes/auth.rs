//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login       -> login
/// GET  /me          -> me (requires auth)
/// GET  /sessions    -> sessions (requires auth)
/// POST /logout      -> logout (requires auth)
/// POST /logout-all  -> logout_all (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/sessions", get(auth::sessions))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
}
