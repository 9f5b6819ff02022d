use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::UserIdentity;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// UUID-v4 identifier; what sessions point at.
    pub id: String,
    /// Unique login email.
    pub email: String,
    /// Argon2 PHC string. Never the plaintext.
    pub hashed_password: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Outstanding password reset token, if one was issued.
    pub reset_token: Option<String>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh account with a new id.
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            hashed_password: hashed_password.into(),
            first_name: None,
            last_name: None,
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The public view, without the hash or reset token.
    pub fn to_identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// "first last", either name alone, or the email.
    pub fn display_name(&self) -> String {
        self.to_identity().display_name()
    }

    /// Apply `update`, stamping `updated_at`.
    pub fn apply(&mut self, update: UserUpdate, now: DateTime<Utc>) {
        if let Some(hash) = update.hashed_password {
            self.hashed_password = hash;
        }
        if let Some(first) = update.first_name {
            self.first_name = Some(first);
        }
        if let Some(last) = update.last_name {
            self.last_name = Some(last);
        }
        if let Some(token) = update.reset_token {
            self.reset_token = token;
        }
        self.updated_at = now;
    }
}

/// The key a user can be looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserQuery {
    /// By id.
    Id(String),
    /// By email.
    Email(String),
    /// By outstanding reset token.
    ResetToken(String),
}

impl UserQuery {
    pub(crate) fn matches(&self, user: &User) -> bool {
        match self {
            UserQuery::Id(id) => &user.id == id,
            UserQuery::Email(email) => &user.email == email,
            UserQuery::ResetToken(token) => user.reset_token.as_deref() == Some(token.as_str()),
        }
    }
}

/// Changes to apply to a user. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    /// New password hash.
    pub hashed_password: Option<String>,
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// `Some(None)` clears the reset token.
    pub reset_token: Option<Option<String>>,
}

impl UserUpdate {
    /// Set a new password hash.
    pub fn password(mut self, hashed_password: impl Into<String>) -> Self {
        self.hashed_password = Some(hashed_password.into());
        self
    }

    /// Set both names.
    pub fn names(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// Issue or clear the reset token.
    pub fn reset_token(mut self, token: Option<String>) -> Self {
        self.reset_token = Some(token);
        self
    }
}
