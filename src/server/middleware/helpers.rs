//! Helper functions for middleware

use crate::auth::RequestCredentials;
use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Header a reverse proxy sets to the original caller address
pub const REAL_IP_HEADER: &str = "x-real-ip";
/// Header carrying a trusted-client API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Address used when neither the proxy header nor the peer address is known
pub const UNKNOWN_ADDR: &str = "unknown";

/// Pull the credential headers and caller address out of a request
pub fn extract_credentials(req: &HttpRequest, trust_proxy_header: bool) -> RequestCredentials {
    let headers = req.headers();
    RequestCredentials {
        authorization: header_value(headers, "authorization"),
        api_key: header_value(headers, API_KEY_HEADER),
        client_addr: client_addr(headers, req.peer_addr(), trust_proxy_header),
    }
}

/// Non-UTF-8 values come back as an empty string so they fail validation
/// instead of reading as absent
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| v.to_str().map(str::to_string).unwrap_or_default())
}

/// Caller address without a port
pub fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_header: bool) -> String {
    if trust_proxy_header {
        if let Some(real_ip) = headers
            .get(REAL_IP_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return strip_port(real_ip);
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_ADDR.to_string())
}

fn strip_port(addr: &str) -> String {
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return ip.to_string();
    }
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return sock.ip().to_string();
    }
    addr.to_string()
}

/// Routes that bypass admission entirely
pub fn is_public_route(path: &str) -> bool {
    const PUBLIC_ROUTES: &[&str] = &["/health"];

    PUBLIC_ROUTES
        .iter()
        .any(|&route| path == route || path.starts_with(&format!("{route}/")))
}
