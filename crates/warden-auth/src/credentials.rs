use warden_core::{WardenError, WardenResult};
use warden_security::BasicCredentials;

/// An email and plaintext password as submitted by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Both parts must be non-empty.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> WardenResult<Self> {
        let email = email.into();
        let password = password.into();
        if email.trim().is_empty() {
            return Err(WardenError::InvalidInput("email missing".to_string()));
        }
        if password.is_empty() {
            return Err(WardenError::InvalidInput("password missing".to_string()));
        }
        Ok(Self { email, password })
    }

    /// The login email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The plaintext password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

// Keeps the password out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl TryFrom<BasicCredentials> for Credentials {
    type Error = WardenError;

    fn try_from(basic: BasicCredentials) -> WardenResult<Self> {
        Self::new(basic.email, basic.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parts() {
        assert!(matches!(
            Credentials::new("", "pw"),
            Err(WardenError::InvalidInput(msg)) if msg == "email missing"
        ));
        assert!(matches!(
            Credentials::new("bob@example.com", ""),
            Err(WardenError::InvalidInput(msg)) if msg == "password missing"
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::new("bob@example.com", "hunter2").unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("bob@example.com"));
        assert!(!shown.contains("hunter2"));
    }
}
