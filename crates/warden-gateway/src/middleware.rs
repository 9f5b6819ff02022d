use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};
use warden_auth::AuthFacade;
use warden_core::WardenError;
use warden_security::require_auth;

/// Paths reachable without a session.
pub const DEFAULT_EXCLUDED_PATHS: [&str; 4] = [
    "/api/v1/status/",
    "/api/v1/auth_session/login/",
    "/api/v1/auth_session/register/",
    "/api/v1/reset_password/",
];

/// Shared middleware state.
#[derive(Clone)]
pub struct AuthState {
    /// Resolves cookies and Basic headers to users.
    pub facade: AuthFacade,
    /// Entries for [`require_auth`].
    pub excluded_paths: Vec<String>,
    /// Name of the session cookie.
    pub cookie_name: String,
}

/// Value of cookie `name` in a `Cookie` header, if present and non-empty.
pub fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Auth middleware: resolves the current user for every protected path.
///
/// The session cookie is tried first, then an `Authorization: Basic` header.
/// Neither present is 401; present but not resolving to a user is 403; a
/// failing session store is 503. On success the user's identity is added to
/// the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !require_auth(request.uri().path(), &state.excluded_paths) {
        return next.run(request).await;
    }

    let cookie = session_cookie(request.headers(), &state.cookie_name);
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let resolved = match (cookie, authorization) {
        (Some(session_id), _) => state.facade.current_user(&session_id).await,
        (None, Some(header)) => state.facade.current_user_basic(&header).await,
        (None, None) => {
            debug!(path = %request.uri().path(), "Rejected request: no credentials");
            return ApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    match resolved {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(WardenError::StorageUnavailable(reason)) => {
            warn!(reason = %reason, "Session store unavailable");
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response()
        }
        Err(e) => {
            debug!(error = %e, path = %request.uri().path(), "Rejected request");
            ApiError::forbidden().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookie: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static(cookie));
        headers
    }

    #[test]
    fn test_session_cookie_found() {
        let h = headers("theme=dark; session_id=abc-123; other=1");
        assert_eq!(session_cookie(&h, "session_id").as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_session_cookie_missing_or_empty() {
        assert!(session_cookie(&headers("theme=dark"), "session_id").is_none());
        assert!(session_cookie(&headers("session_id="), "session_id").is_none());
        assert!(session_cookie(&HeaderMap::new(), "session_id").is_none());
    }

    #[test]
    fn test_default_exclusions() {
        assert!(!require_auth("/api/v1/status", &DEFAULT_EXCLUDED_PATHS));
        assert!(!require_auth("/api/v1/auth_session/login", &DEFAULT_EXCLUDED_PATHS));
        assert!(require_auth("/api/v1/users/me", &DEFAULT_EXCLUDED_PATHS));
        assert!(require_auth("/api/v1/auth_session/logout", &DEFAULT_EXCLUDED_PATHS));
    }
}
