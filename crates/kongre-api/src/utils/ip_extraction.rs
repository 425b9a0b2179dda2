//! Client IP extraction
//!
//! Reads the submitter's address from proxy headers, honoring only as many
//! `X-Forwarded-For` hops as there are trusted proxies in front of the service.

use crate::state::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Shared rate-limit key for requests whose address cannot be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

const MAX_USER_AGENT_LEN: usize = 512;

/// Extract and validate the client IP from request headers.
///
/// Each trusted proxy appends the address it received the request from, so with
/// `trusted_proxy_count = N` the client is the N-th `X-Forwarded-For` entry from the
/// right. Everything to its left was written by the client and is ignored. `X-Real-IP`
/// and then the socket address are used when the header yields nothing valid. With no
/// trusted proxies both headers are client-controlled and only the socket is used.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> Option<IpAddr> {
    let socket_ip = socket_addr.map(|addr| addr.ip());
    if trusted_proxy_count == 0 {
        return socket_ip;
    }

    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| from_forwarded_for(value, trusted_proxy_count))
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok())
        })
        .or(socket_ip)
}

fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<IpAddr> {
    let hops: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    // Shorter chains than the proxy count clamp to the left-most hop.
    let position = hops.len().saturating_sub(trusted_proxy_count.max(1));

    hops.get(position)?.parse().ok()
}

/// Diagnostic request metadata recorded with a submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Key for the per-client rate limit
    pub fn rate_limit_key(&self) -> &str {
        self.ip.as_deref().unwrap_or(UNKNOWN_CLIENT)
    }
}

impl FromRequestParts<Arc<AppState>> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let ip = extract_client_ip(
            &parts.headers,
            socket_addr.as_ref(),
            state.config.server.trusted_proxy_count,
        )
        .map(|ip| ip.to_string());

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect::<String>())
            .filter(|ua| !ua.is_empty());

        Ok(ClientInfo { ip, user_agent })
    }
}
