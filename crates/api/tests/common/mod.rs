#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use warden_core::clock::ManualClock;
use warden_core::password::HashCost;

use warden_api::bootstrap::in_memory_auth_service;
use warden_api::config::{AuthConfig, ServerConfig};
use warden_api::router::build_app_router;
use warden_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses the in-memory backend and a deliberately cheap Argon2 cost.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        session_sweep_interval_secs: 3600,
        cookie_secure: true,
        auth: AuthConfig {
            hash_cost: HashCost::new(1024, 1, 1),
            ..AuthConfig::default()
        },
    }
}

/// Build the full application router over in-memory stores.
///
/// Returns the clock driving session expiry so tests can move time forward.
pub fn build_test_app() -> (Router, Arc<ManualClock>) {
    let config = test_config();
    let clock = Arc::new(ManualClock::starting_now());
    let auth = in_memory_auth_service(&config.auth, clock.clone())
        .expect("auth service should build");

    let state = AppState {
        auth: Arc::new(auth),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), clock)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_with_cookie(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

pub const PASSWORD: &str = "correct horse battery";

/// Register a user through the API and return the created profile.
pub async fn register(app: Router, name: &str, email: &str) -> serde_json::Value {
    let body = serde_json::json!({ "name": name, "email": email, "password": PASSWORD });
    let response = post_json(app, "/api/v1/users", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Log in through the API and return the raw token.
pub async fn login(app: Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}
