//! HTTP basic auth for every dashboard route

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};

use super::state::{AppState, BasicCredentials};

const REALM: &str = r#"Basic realm="Authorization Required""#;

pub async fn basic_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(decode_basic)
        .is_some_and(|(user, pass)| credentials_match(&state.credentials, &user, &pass));

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Rejected unauthenticated request");
        return unauthorized();
    }

    next.run(request).await
}

/// `Basic dXNlcjpwYXNz` -> `("user", "pass")`
pub(crate) fn decode_basic(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn credentials_match(expected: &BasicCredentials, user: &str, pass: &str) -> bool {
    // Evaluate both so timing does not reveal which half was wrong
    let user_ok = constant_time_eq(expected.username.as_bytes(), user.as_bytes());
    let pass_ok = constant_time_eq(expected.password.as_bytes(), pass.as_bytes());
    user_ok & pass_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn unauthorized() -> Response {
    let mut response = StatusCode::UNAUTHORIZED.into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(REALM));
    response
}
