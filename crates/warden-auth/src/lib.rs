//! Authentication facade for the Warden session authentication service.
//!
//! [`AuthFacade`] is the single entry point the HTTP layer talks to: it checks
//! credentials against a [`warden_users::UserStore`], issues and resolves
//! sessions through a [`warden_session::SessionPolicy`], and runs the
//! registration and password-reset flows.

/// Login credentials.
pub mod credentials;
/// The facade itself.
pub mod facade;

pub use credentials::Credentials;
pub use facade::AuthFacade;
