//! Route handlers.

use crate::error::ApiError;
use crate::middleware::session_cookie;
use crate::server::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use warden_auth::Credentials;
use warden_core::{UserIdentity, WardenError};

/// Body of the register and login forms.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    /// Login email.
    pub email: Option<String>,
    /// Plaintext password.
    pub password: Option<String>,
}

impl CredentialsForm {
    fn into_credentials(self) -> Result<Credentials, ApiError> {
        let email = self.email.unwrap_or_default();
        let password = self.password.unwrap_or_default();
        Credentials::new(email, password).map_err(ApiError::from)
    }
}

/// Body of `POST /reset_password`.
#[derive(Debug, Default, Deserialize)]
pub struct ResetRequestForm {
    /// Account to issue a token for.
    pub email: Option<String>,
}

/// Body of `PUT /reset_password`.
#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordForm {
    /// Accepted but not checked; the token alone names the account.
    pub email: Option<String>,
    /// Token from `POST /reset_password`.
    pub reset_token: Option<String>,
    /// Replacement password.
    pub new_password: Option<String>,
}

fn session_cookie_header(name: &str, value: &str, max_age: Option<u32>) -> Option<HeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(secs) = max_age {
        cookie.push_str(&format!("; Max-Age={secs}"));
    }
    HeaderValue::from_str(&cookie).ok()
}

/// `GET /api/v1/status`
pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// `POST /api/v1/auth_session/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Json<Value>, ApiError> {
    let credentials = form.into_credentials()?;
    match state.facade.register_user(&credentials).await {
        Ok(user) => Ok(Json(json!({ "email": user.email, "message": "user created" }))),
        Err(WardenError::AlreadyRegistered(_)) => {
            Err(ApiError::bad_request("email already registered"))
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /api/v1/auth_session/login`
///
/// Unlike [`AuthFacade::authenticate`](warden_auth::AuthFacade::authenticate),
/// this endpoint tells an unknown email (404) apart from a wrong password (401).
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let credentials = form.into_credentials()?;

    if state.facade.find_by_email(credentials.email()).await?.is_none() {
        return Err(ApiError::not_found("no user found for this email"));
    }

    let (identity, session_id) = match state.facade.login(&credentials).await {
        Ok(pair) => pair,
        Err(WardenError::InvalidCredentials) => {
            return Err(ApiError::unauthorized("wrong password"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %identity.id, "Logged in");
    let mut response = Json(identity).into_response();
    if let Some(cookie) = session_cookie_header(&state.cookie_name, &session_id, None) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// `DELETE /api/v1/auth_session/logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(session_id) = session_cookie(&headers, &state.cookie_name) else {
        return Err(ApiError::not_found("no session"));
    };
    if !state.facade.destroy_session(&session_id).await? {
        return Err(ApiError::not_found("no session"));
    }

    let mut response = Json(json!({})).into_response();
    if let Some(cookie) = session_cookie_header(&state.cookie_name, "", Some(0)) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// `GET /api/v1/users/me`
pub async fn me(Extension(identity): Extension<UserIdentity>) -> Json<UserIdentity> {
    Json(identity)
}

/// `POST /api/v1/reset_password`
pub async fn get_reset_password_token(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResetRequestForm>,
) -> Result<Json<Value>, ApiError> {
    let email = form.email.unwrap_or_default();
    match state.facade.get_reset_password_token(&email).await {
        Ok(token) => Ok(Json(json!({ "email": email, "reset_token": token }))),
        Err(e @ WardenError::StorageUnavailable(_)) => Err(e.into()),
        Err(_) => Err(ApiError::forbidden()),
    }
}

/// `PUT /api/v1/reset_password`
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Json<Value>, ApiError> {
    let token = form.reset_token.unwrap_or_default();
    let password = form.new_password.unwrap_or_default();
    match state.facade.update_password(&token, &password).await {
        Ok(identity) => Ok(Json(
            json!({ "email": identity.email, "message": "Password updated" }),
        )),
        Err(e @ WardenError::StorageUnavailable(_)) => Err(e.into()),
        Err(_) => Err(ApiError::forbidden()),
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}
