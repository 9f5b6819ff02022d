//! Security primitives for the Warden session authentication service.
//!
//! Provides password hashing, HTTP Basic credential parsing, path exclusion
//! and PII redaction for log output.
//!
//! # Main types
//!
//! - [`hash_password`] / [`verify_password`] — Argon2 password hashing.
//! - [`BasicCredentials`] — Email and password carried by a `Basic` header.
//! - [`require_auth`] — Decides whether a request path needs authentication.
//! - [`Redactor`] — Masks `field=value` pairs naming personal data.
//! - [`RedactingMakeWriter`] — A `tracing-subscriber` writer that redacts every line.

/// HTTP Basic credential parsing.
pub mod basic;
/// Argon2 password hashing.
pub mod password;
/// Request path exclusion.
pub mod paths;
/// PII redaction for logs.
pub mod redact;

pub use basic::BasicCredentials;
pub use password::{hash_password, verify_password};
pub use paths::require_auth;
pub use redact::{filter_datum, RedactingMakeWriter, Redactor, PII_FIELDS};
