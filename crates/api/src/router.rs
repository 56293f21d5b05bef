//! Shared application router builder.
//!
//! [`build_app_router`] is used by both `main.rs` and the integration tests,
//! so tests exercise the production middleware stack.

use std::iter::once;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::{
    SetSensitiveRequestHeadersLayer, SetSensitiveResponseHeadersLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Largest accepted request body. Credential payloads are tiny.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Build the full application [`Router`] with all middleware layers.
///
/// Outermost first, a request passes through:
///
/// 1. CORS
/// 2. Request ID assignment
/// 3. Redaction of `Authorization` and `Cookie`
/// 4. Request/response tracing
/// 5. Redaction of `Set-Cookie`
/// 6. Request ID propagation to the response
/// 7. Timeout
/// 8. Body size limit
/// 9. Panic recovery
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static("x-request-id");
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(true))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .include_headers(true),
        );

    let api = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes());

    api.layer(CatchPanicLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        // Tokens travel in these headers; the trace layer must only see them marked.
        .layer(SetSensitiveResponseHeadersLayer::new(once(SET_COOKIE)))
        .layer(trace)
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION, COOKIE]))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// Build the CORS layer from the configured origins.
///
/// Credentials are allowed so browsers send the session cookie. An invalid
/// origin panics at startup.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
