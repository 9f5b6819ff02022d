//! HTTP gateway for the Warden session authentication service.
//!
//! A thin axum router over [`warden_auth::AuthFacade`]: session login and
//! logout, registration, password reset, and an auth middleware that
//! attaches the current [`warden_core::UserIdentity`] to every protected
//! request.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use middleware::{AuthState, DEFAULT_EXCLUDED_PATHS};
pub use server::{GatewayConfig, GatewayServer};
