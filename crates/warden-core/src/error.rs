use thiserror::Error;

/// A convenience `Result` alias using [`WardenError`].
pub type WardenResult<T> = Result<T, WardenError>;

/// Top-level error type for the Warden service.
///
/// Session outcomes (`NotFound`, `Expired`) are ordinary results the caller
/// maps to "unauthenticated"; `StorageUnavailable` is fatal to the current
/// operation and must never be read as a miss.
#[derive(Error, Debug)]
pub enum WardenError {
    /// Missing or malformed arguments. Caller error, never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No such session.
    #[error("Session not found")]
    NotFound,

    /// The session exists but its time-to-live has elapsed.
    #[error("Session expired")]
    Expired,

    /// The durable store could not be read or written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// No authenticated user could be derived from the request.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Email and password do not match a registered user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No user is registered under the given key.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A user with this email already exists.
    #[error("User {0} already exists")]
    AlreadyRegistered(String),

    /// Configuration could not be parsed or validated.
    #[error("Config error: {0}")]
    Config(String),
}

impl WardenError {
    /// True for the outcomes that just mean "this session does not authenticate".
    pub fn is_session_miss(&self) -> bool {
        matches!(self, WardenError::NotFound | WardenError::Expired)
    }
}

impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        WardenError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(err: serde_json::Error) -> Self {
        WardenError::StorageUnavailable(format!("corrupt record: {err}"))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for WardenError {
    fn from(err: rusqlite::Error) -> Self {
        WardenError::StorageUnavailable(err.to_string())
    }
}
