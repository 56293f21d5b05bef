//! Handlers for the `/auth` resource (login, current user, sessions, logout).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::models::{Session, SessionUser, UserProfile};
use warden_core::types::Timestamp;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::{clear_session_cookie, session_cookie, AuthUser};
use crate::middleware::client_info::ClientMeta;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login payload. The token is shown exactly once.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
    pub expires_at: Timestamp,
}

/// Payload for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub user: SessionUser,
    pub session_id: Uuid,
    pub expires_at: Timestamp,
}

/// One entry in `GET /auth/sessions`. Never includes the token or its digest.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    /// Whether this is the session making the request.
    pub current: bool,
}

impl SessionInfo {
    fn from_session(session: Session, current_id: Uuid) -> Self {
        Self {
            current: session.id == current_id,
            id: session.id,
            created_at: session.created_at,
            expires_at: session.expires_at,
            user_agent: session.user_agent,
            ip_address: session.ip_address,
        }
    }
}

/// Payload for `POST /auth/logout-all`.
#[derive(Debug, Serialize)]
pub struct RevokedCount {
    pub revoked: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Verify email + password and open a session. The raw token is returned in
/// the body and set as an `HttpOnly` cookie.
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    AppJson(input): AppJson<LoginRequest>,
) -> AppResult<Response> {
    let outcome = state
        .auth
        .login(&input.email, &input.password, &client)
        .await?;

    let cookie = session_cookie(
        &outcome.session.token,
        outcome.session.expires_at,
        state.config.cookie_secure,
    );
    let body = DataResponse {
        data: LoginResponse {
            user: outcome.user,
            token: outcome.session.token.into_inner(),
            expires_at: outcome.session.expires_at,
        },
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser) -> Json<DataResponse<CurrentUser>> {
    Json(DataResponse {
        data: CurrentUser {
            user: auth.user,
            session_id: auth.session_id,
            expires_at: auth.expires_at,
        },
    })
}

/// GET /api/v1/auth/sessions
///
/// Live sessions of the caller, newest first.
pub async fn sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<SessionInfo>>>> {
    let sessions = state.auth.active_sessions(auth.user.id).await?;
    let data = sessions
        .into_iter()
        .map(|s| SessionInfo::from_session(s, auth.session_id))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented session and clear the cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<Response> {
    state.auth.logout(auth.token.as_str()).await?;
    tracing::info!(user_id = auth.user.id, session_id = %auth.session_id, "User logged out");

    let cookie = clear_session_cookie(state.config.cookie_secure);
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]).into_response())
}

/// POST /api/v1/auth/logout-all
///
/// Revoke every live session of the caller, including this one.
pub async fn logout_all(State(state): State<AppState>, auth: AuthUser) -> AppResult<Response> {
    let revoked = state.auth.logout_everywhere(auth.user.id).await?;

    let cookie = clear_session_cookie(state.config.cookie_secure);
    Ok((
        [(SET_COOKIE, cookie)],
        Json(DataResponse {
            data: RevokedCount { revoked },
        }),
    )
        .into_response())
}
