//! Session-cookie authentication middleware and cookie helpers.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::error::codes;
use super::{ApiError, AppState};
use crate::services::session_service::SessionError;

pub const SESSION_COOKIE: &str = "session_id";

/// How long a login session lasts.
pub const SESSION_TTL_HOURS: i64 = 24;

/// The authenticated user's ID, inserted into request extensions by
/// [`auth_middleware`] before any protected handler runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i32);

/// Gate for everything under `/api`.
///
/// A missing cookie is a 403 (`MISSING_SESSION`); a cookie that does not
/// resolve to a live session is a 401. Expired and unknown sessions produce
/// the same response.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(session_id) = session_cookie(request.headers()) else {
        return Err(ApiError::forbidden(
            "Missing session cookie",
            codes::MISSING_SESSION,
        ));
    };

    let user_id = state
        .sessions
        .validate_session(&session_id)
        .await
        .map_err(|e| match e {
            SessionError::Invalid => ApiError::unauthorized("Invalid or expired session"),
            other => other.into(),
        })?;

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

/// Pulls the session ID out of the `Cookie` header, if present.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// Builds the `Set-Cookie` value for a fresh session.
pub fn session_cookie_value(session_id: &str, secure: bool) -> Result<HeaderValue, ApiError> {
    let max_age = SESSION_TTL_HOURS * 3600;
    let mut cookie =
        format!("{SESSION_COOKIE}={session_id}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal(format!("Failed to build session cookie: {e}")))
}

/// Builds the `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie(secure: bool) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal(format!("Failed to build session cookie: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc-123; lang=en"),
        );
        assert_eq!(session_cookie(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn test_session_cookie_missing_or_empty() {
        let headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_id="));
        assert_eq!(session_cookie(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("other=value"));
        assert_eq!(session_cookie(&headers), None);
    }

    #[test]
    fn test_cookie_values() {
        let value = session_cookie_value("abc", true).unwrap();
        let text = value.to_str().unwrap();
        assert!(text.starts_with("session_id=abc;"));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("Secure"));

        let cleared = clear_session_cookie(false).unwrap();
        let text = cleared.to_str().unwrap();
        assert!(text.contains("Max-Age=0"));
        assert!(!text.contains("Secure"));
    }
}
