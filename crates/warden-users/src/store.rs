use crate::model::{User, UserQuery, UserUpdate};
use async_trait::async_trait;
use warden_core::{WardenError, WardenResult};

/// Persistence for user accounts.
///
/// Emails are unique: [`add_user`](UserStore::add_user) fails with
/// `AlreadyRegistered` rather than creating a second account.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a new account under `email`.
    async fn add_user(&self, email: &str, hashed_password: &str) -> WardenResult<User>;

    /// First user matching `query`, if any.
    async fn find_user_by(&self, query: &UserQuery) -> WardenResult<Option<User>>;

    /// Apply `update` to the user with `user_id`. `UserNotFound` if there is none.
    async fn update_user(&self, user_id: &str, update: UserUpdate) -> WardenResult<User>;

    /// Delete a user. Returns whether it existed.
    async fn remove(&self, user_id: &str) -> WardenResult<bool>;

    /// Every user, oldest first.
    async fn all(&self) -> WardenResult<Vec<User>>;

    /// Shorthand for a lookup by id.
    async fn get(&self, user_id: &str) -> WardenResult<Option<User>> {
        self.find_user_by(&UserQuery::Id(user_id.to_string())).await
    }

    /// Number of registered users.
    async fn count(&self) -> WardenResult<usize> {
        Ok(self.all().await?.len())
    }
}

/// Shared argument check for `add_user` implementations.
pub(crate) fn validate_new_user(email: &str, hashed_password: &str) -> WardenResult<()> {
    if email.trim().is_empty() {
        return Err(WardenError::InvalidInput("email is empty".to_string()));
    }
    if hashed_password.is_empty() {
        return Err(WardenError::InvalidInput("password hash is empty".to_string()));
    }
    Ok(())
}
