//! Builds the per-request [`RequestContext`].
//!
//! Runs outside every guard so that headers queued by guard stages (rate
//! limit counters) reach the response even when a stage rejects.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use invenfinder_auth::{Credentials, RequestContext};

use crate::state::AppState;

/// Header carrying a session token for non-browser clients.
pub const API_KEY_HEADER: &str = "API-Key";
/// Cookie carrying a session token for browsers.
pub const SESSION_COOKIE: &str = "SID";
/// Header naming the identity provider that issued the token.
pub const SSO_NAME_HEADER: &str = "SSO-Name";

const UNKNOWN_USER_AGENT: &str = "Unknown";

/// Attaches an `Arc<RequestContext>` to the request extensions and copies
/// queued headers onto the response.
pub async fn attach_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let credentials = Credentials {
        token: session_token(headers),
        sso_provider: header_str(headers, SSO_NAME_HEADER).map(str::to_string),
    };
    let user_agent = header_str(headers, header::USER_AGENT.as_str())
        .unwrap_or(UNKNOWN_USER_AGENT)
        .to_string();
    let ip = client_ip(&request, state.config.server.trust_proxy);

    let ctx = Arc::new(RequestContext::new(credentials, ip, user_agent));
    request.extensions_mut().insert(Arc::clone(&ctx));

    let mut response = next.run(request).await;

    for (name, value) in ctx.take_headers() {
        match (HeaderName::try_from(name), HeaderValue::from_str(&value)) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = name, "Dropping invalid response header"),
        }
    }
    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The `API-Key` header wins over the `SID` cookie.
fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = header_str(headers, API_KEY_HEADER) {
        return Some(token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn client_ip(request: &Request, trust_proxy: bool) -> Option<String> {
    if trust_proxy {
        let forwarded = header_str(request.headers(), "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}
