//! Handlers for the `/users` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use warden_core::models::UserProfile;
use warden_core::types::DbId;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// POST /api/v1/users
///
/// Open registration. Returns 409 when the email is already registered.
pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserProfile>>)> {
    let user = state
        .auth
        .create_user(&input.name, &input.email, &input.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserProfile::from(&user),
        }),
    ))
}

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<UserProfile>>>> {
    let users = state.auth.list_users().await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserProfile>>> {
    let user = state.auth.get_user(id).await?;
    Ok(Json(DataResponse { data: user }))
}
