//! Client identity resolution for rate limiting.
//!
//! `X-Forwarded-For` is client-controlled unless a trusted reverse proxy
//! rewrites it, so it is only consulted when explicitly enabled.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity used when neither a trusted header nor a peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the rate-limit identity for a request.
///
/// With `trust_forwarded_for`, the first well-formed IP in `X-Forwarded-For`
/// wins. Otherwise, or when the header is absent or malformed, the peer
/// address is used with its port stripped.
pub fn resolve_identity(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(ip) = forwarded_client_ip(headers) {
            return ip.to_string();
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

/// Original client address from the leftmost `X-Forwarded-For` entry.
pub fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    first.parse().ok()
}
