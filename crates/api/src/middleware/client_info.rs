use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use warden_core::models::ClientInfo;

/// Client metadata recorded on new sessions.
///
/// The IP is taken from the first `X-Forwarded-For` entry, then `X-Real-IP`,
/// then the socket peer address when the server was started with connect info.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub ClientInfo);

impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientMeta(ClientInfo {
            user_agent: header_str(&parts.headers, USER_AGENT.as_str()).map(str::to_string),
            ip_address: forwarded_ip(&parts.headers).or(peer),
        }))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
}
