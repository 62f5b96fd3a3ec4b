use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::{AuthError, Claims, SessionCodec};
use crate::state::AppState;

// -- Cookie helpers --

pub fn session_cookie(name: &str, token: &str, max_age: chrono::Duration) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name,
        token,
        max_age.num_seconds()
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

/// Resolve the caller's session from the cookie. An empty cookie (left by
/// logout) counts as no session.
pub fn authenticate(
    headers: &HeaderMap,
    cookie_name: &str,
    codec: &SessionCodec,
) -> Result<Claims, AuthError> {
    let token = get_cookie_value(headers, cookie_name)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;
    codec.verify(token)
}

/// Middleware guarding routes that need a session. On success the claims
/// are attached to the request extensions; any failure redirects to login.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(req.headers(), &state.config.auth.cookie_name, &state.tokens) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(AuthError::MissingToken) => {
            tracing::debug!("No session token on {}, redirecting to login", req.uri());
            Redirect::to("/login").into_response()
        }
        Err(e) => {
            tracing::warn!("Session verification failed on {}: {}", req.uri(), e);
            Redirect::to("/login").into_response()
        }
    }
}
