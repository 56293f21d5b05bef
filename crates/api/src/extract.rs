//! Request body extractors whose rejections use the JSON error envelope.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` with rejections mapped to [`AppError::BadRequest`].
///
/// A malformed body, a missing field or a wrong content type answers
/// `{"error", "code": "BAD_REQUEST"}` instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
