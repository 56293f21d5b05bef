//! Session-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;
use warden_core::error::CoreError;
use warden_core::models::SessionUser;
use warden_core::token::SessionToken;
use warden_core::types::Timestamp;

use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the raw session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Authenticated caller, resolved from a live session.
///
/// The token is read from `Authorization: Bearer <token>` first and from the
/// `session_token` cookie otherwise. Every failure (missing, malformed,
/// unknown, expired, revoked) is the same 401.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: SessionUser,
    pub session_id: Uuid,
    pub expires_at: Timestamp,
    /// The presented token, kept so the handler can revoke this session.
    pub token: SessionToken,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = presented_token(&parts.headers)
            .ok_or(AppError::Core(CoreError::Unauthorized))?;

        let session = state.auth.authenticate(&raw).await?;

        Ok(AuthUser {
            user: session.user,
            session_id: session.id,
            expires_at: session.expires_at,
            token: SessionToken::from_raw(raw),
        })
    }
}

/// Raw token from the `Authorization` header, falling back to the cookie.
///
/// A present but malformed `Authorization` header does not fall back.
fn presented_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        // The auth scheme is case-insensitive.
        let (scheme, token) = value.to_str().ok()?.trim().split_once(' ')?;
        let token = token.trim();
        return (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty())
            .then(|| token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that stores `token` until `expires_at`.
pub fn session_cookie(token: &SessionToken, expires_at: Timestamp, secure: bool) -> String {
    format!(
        "{SESSION_COOKIE}={}; HttpOnly;{} SameSite=Lax; Path=/; Expires={}",
        token.as_str(),
        if secure { " Secure;" } else { "" },
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT"),
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    format!(
        "{SESSION_COOKIE}=; HttpOnly;{} SameSite=Lax; Path=/; Max-Age=0",
        if secure { " Secure;" } else { "" },
    )
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let map = headers(&[
            (AUTHORIZATION, "Bearer from-header"),
            (COOKIE, "session_token=from-cookie"),
        ]);
        assert_eq!(presented_token(&map).as_deref(), Some("from-header"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        for header in ["bearer tok", "BEARER tok", "Bearer   tok"] {
            let map = headers(&[(AUTHORIZATION, header)]);
            assert_eq!(presented_token(&map).as_deref(), Some("tok"), "{header}");
        }
        let map = headers(&[(AUTHORIZATION, "Bearer")]);
        assert_eq!(presented_token(&map), None);
    }

    #[test]
    fn cookie_is_found_among_others() {
        let map = headers(&[(COOKIE, "theme=dark; session_token=abc123; lang=en")]);
        assert_eq!(presented_token(&map).as_deref(), Some("abc123"));
    }

    #[test]
    fn malformed_authorization_does_not_fall_back() {
        let map = headers(&[
            (AUTHORIZATION, "Basic dXNlcjpwYXNz"),
            (COOKIE, "session_token=abc123"),
        ]);
        assert_eq!(presented_token(&map), None);
    }

    #[test]
    fn missing_credentials_yield_nothing() {
        assert_eq!(presented_token(&HeaderMap::new()), None);
        let map = headers(&[(COOKIE, "session_token=")]);
        assert_eq!(presented_token(&map), None);
    }

    #[test]
    fn cookie_attributes() {
        let expires = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let token = SessionToken::from_raw("tok");

        let cookie = session_cookie(&token, expires, true);
        assert_eq!(
            cookie,
            "session_token=tok; HttpOnly; Secure; SameSite=Lax; Path=/; Expires=Sat, 01 Jun 2024 12:00:00 GMT"
        );
        assert!(!session_cookie(&token, expires, false).contains("Secure"));
        assert!(clear_session_cookie(true).contains("Max-Age=0"));
    }
}
