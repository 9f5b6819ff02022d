//! Core types and error definitions for the Warden session authentication service.
//!
//! This crate provides the foundational types shared across all Warden crates,
//! including error handling, session records, user identities and clocks.
//!
//! # Main types
//!
//! - [`WardenError`] — Unified error enum for all Warden subsystems.
//! - [`WardenResult`] — Convenience alias for `Result<T, WardenError>`.
//! - [`SessionRecord`] — A session token bound to a user and a creation time.
//! - [`SessionDuration`] — Process-wide session time-to-live.
//! - [`UserIdentity`] — The public view of an authenticated user.
//! - [`Clock`] — Time source injected into everything that stamps or checks expiry.

/// Time sources.
pub mod clock;
/// Error types.
pub mod error;
/// Session records and durations.
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{WardenError, WardenResult};
pub use session::{SessionDuration, SessionRecord};

use serde::{Deserialize, Serialize};

/// The public view of a user, as handed to the HTTP layer.
///
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Optional given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Optional family name.
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserIdentity {
    /// Human readable name: "first last", either part alone, or the email.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}
