use crate::handlers;
use crate::middleware::{auth_middleware, AuthState, DEFAULT_EXCLUDED_PATHS};
use axum::{
    middleware as axum_mw,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warden_auth::AuthFacade;

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "session_id";

/// HTTP-facing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Paths that skip authentication.
    pub excluded_paths: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Shared handler state.
pub struct AppState {
    /// The authentication facade.
    pub facade: AuthFacade,
    /// Name of the session cookie.
    pub cookie_name: String,
}

/// The HTTP gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router with the auth middleware in front of every route.
    pub fn build(facade: AuthFacade, config: GatewayConfig) -> Router {
        let state = Arc::new(AppState {
            facade: facade.clone(),
            cookie_name: config.cookie_name.clone(),
        });
        let auth_state = Arc::new(AuthState {
            facade,
            excluded_paths: config.excluded_paths,
            cookie_name: config.cookie_name,
        });

        Router::new()
            .route("/api/v1/status", get(handlers::status))
            .route("/api/v1/auth_session/register", post(handlers::register))
            .route("/api/v1/auth_session/login", post(handlers::login))
            .route("/api/v1/auth_session/logout", delete(handlers::logout))
            .route("/api/v1/users/me", get(handlers::me))
            .route(
                "/api/v1/reset_password",
                post(handlers::get_reset_password_token).put(handlers::update_password),
            )
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(axum_mw::from_fn_with_state(auth_state, auth_middleware))
    }
}
