//! Client metadata copied into audit entries.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use crate::state::AppState;

/// Request id, client IP, and user agent of the current request.
///
/// Never rejects: every field is optional.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub request_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The socket peer, or the first `X-Forwarded-For` hop when the deployment
/// says a proxy in front of us owns that header.
fn client_ip(parts: &Parts, trust_proxy_headers: bool) -> Option<String> {
    let forwarded = trust_proxy_headers
        .then(|| header(parts, "x-forwarded-for"))
        .flatten()
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());

    forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

impl FromRequestParts<AppState> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RequestMeta {
            request_id: header(parts, "x-request-id"),
            ip_address: client_ip(parts, state.config.trust_proxy_headers),
            user_agent: header(parts, "user-agent"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(forwarded: Option<&str>, peer: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = forwarded {
            builder = builder.header("x-forwarded-for", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if let Some(addr) = peer {
            let addr: SocketAddr = addr.parse().unwrap();
            parts.extensions.insert(ConnectInfo(addr));
        }
        parts
    }

    #[test]
    fn forwarded_header_ignored_by_default() {
        let parts = parts(Some("6.6.6.6"), Some("10.1.2.3:5000"));
        assert_eq!(client_ip(&parts, false).as_deref(), Some("10.1.2.3"));
    }

    #[test]
    fn forwarded_header_without_peer_is_still_ignored() {
        let parts = parts(Some("6.6.6.6"), None);
        assert_eq!(client_ip(&parts, false), None);
    }

    #[test]
    fn trusted_proxy_uses_first_hop() {
        let parts = parts(Some(" 203.0.113.9 , 10.0.0.1"), Some("10.1.2.3:5000"));
        assert_eq!(client_ip(&parts, true).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn trusted_proxy_falls_back_to_peer() {
        let parts = parts(None, Some("10.1.2.3:5000"));
        assert_eq!(client_ip(&parts, true).as_deref(), Some("10.1.2.3"));
    }
}
