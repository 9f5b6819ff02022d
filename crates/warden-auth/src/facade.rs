use crate::credentials::Credentials;
use std::sync::Arc;
use tracing::{debug, info, warn};
use warden_core::{UserIdentity, WardenError, WardenResult};
use warden_security::{hash_password, verify_password, BasicCredentials};
use warden_session::SessionPolicy;
use warden_users::{User, UserQuery, UserStore, UserUpdate};

/// Ties user accounts to sessions.
///
/// Holds the user store and the session chain it was built with; nothing is
/// global, so tests and the server each assemble their own.
#[derive(Clone)]
pub struct AuthFacade {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionPolicy>,
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn blocking<T, F>(f: F) -> WardenResult<T>
where
    F: FnOnce() -> WardenResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| WardenError::StorageUnavailable(format!("password worker failed: {e}")))?
}

impl AuthFacade {
    /// Build a facade over `users` and `sessions`.
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionPolicy>) -> Self {
        Self { users, sessions }
    }

    /// The user store.
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// The session chain.
    pub fn sessions(&self) -> &Arc<dyn SessionPolicy> {
        &self.sessions
    }

    /// Check `credentials`. An unknown email and a wrong password are
    /// indistinguishable to the caller: both are `InvalidCredentials`.
    pub async fn authenticate(&self, credentials: &Credentials) -> WardenResult<UserIdentity> {
        let Some(user) = self.find_by_email(credentials.email()).await? else {
            debug!("Login for unknown email");
            return Err(WardenError::InvalidCredentials);
        };

        let password = credentials.password().to_string();
        let hash = user.hashed_password.clone();
        let valid = blocking(move || Ok(verify_password(&password, &hash))).await?;
        if !valid {
            warn!(user_id = %user.id, "Wrong password");
            return Err(WardenError::InvalidCredentials);
        }
        Ok(user.to_identity())
    }

    /// Authenticate and open a session in one step.
    pub async fn login(&self, credentials: &Credentials) -> WardenResult<(UserIdentity, String)> {
        let identity = self.authenticate(credentials).await?;
        let session_id = self.create_session(&identity.id).await?;
        Ok((identity, session_id))
    }

    /// Issue a session for `user_id`.
    pub async fn create_session(&self, user_id: &str) -> WardenResult<String> {
        self.sessions.create(user_id).await
    }

    /// The user behind `session_id`.
    ///
    /// Unknown, expired and orphaned sessions are all `Unauthenticated`;
    /// storage failures are passed through untouched.
    pub async fn current_user(&self, session_id: &str) -> WardenResult<UserIdentity> {
        let user_id = match self.sessions.resolve(session_id).await {
            Ok(user_id) => user_id,
            Err(WardenError::NotFound) => {
                debug!("Unknown session");
                return Err(WardenError::Unauthenticated);
            }
            Err(WardenError::Expired) => {
                debug!("Expired session");
                return Err(WardenError::Unauthenticated);
            }
            Err(e) => return Err(e),
        };

        match self.users.get(&user_id).await? {
            Some(user) => Ok(user.to_identity()),
            None => {
                warn!(user_id = %user_id, "Session refers to a deleted user");
                Err(WardenError::Unauthenticated)
            }
        }
    }

    /// The user named by an `Authorization: Basic ...` header.
    pub async fn current_user_basic(&self, authorization: &str) -> WardenResult<UserIdentity> {
        let credentials = BasicCredentials::from_header(authorization)
            .and_then(|basic| Credentials::try_from(basic).ok())
            .ok_or(WardenError::Unauthenticated)?;

        match self.authenticate(&credentials).await {
            Err(WardenError::InvalidCredentials) => Err(WardenError::Unauthenticated),
            other => other,
        }
    }

    /// End a session. `false` if there was nothing to end.
    pub async fn destroy_session(&self, session_id: &str) -> WardenResult<bool> {
        self.sessions.destroy(session_id).await
    }

    /// Look a user up by email.
    pub async fn find_by_email(&self, email: &str) -> WardenResult<Option<User>> {
        self.users
            .find_user_by(&UserQuery::Email(email.to_string()))
            .await
    }

    /// Create an account. Only the Argon2 hash of the password is stored.
    pub async fn register_user(&self, credentials: &Credentials) -> WardenResult<User> {
        if self.find_by_email(credentials.email()).await?.is_some() {
            return Err(WardenError::AlreadyRegistered(credentials.email().to_string()));
        }
        let password = credentials.password().to_string();
        let hash = blocking(move || hash_password(&password)).await?;
        let user = self.users.add_user(credentials.email(), &hash).await?;
        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    /// Whether `email` and `password` would log in.
    pub async fn valid_login(&self, email: &str, password: &str) -> WardenResult<bool> {
        let Ok(credentials) = Credentials::new(email, password) else {
            return Ok(false);
        };
        match self.authenticate(&credentials).await {
            Ok(_) => Ok(true),
            Err(WardenError::InvalidCredentials) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Issue a fresh password reset token for `email`, replacing any earlier one.
    pub async fn get_reset_password_token(&self, email: &str) -> WardenResult<String> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| WardenError::UserNotFound(email.to_string()))?;
        let token = uuid::Uuid::new_v4().to_string();
        self.users
            .update_user(&user.id, UserUpdate::default().reset_token(Some(token.clone())))
            .await?;
        info!(user_id = %user.id, "Password reset token issued");
        Ok(token)
    }

    /// Set a new password for whoever holds `reset_token`, then retire the token.
    pub async fn update_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> WardenResult<UserIdentity> {
        if new_password.is_empty() {
            return Err(WardenError::InvalidInput("password missing".to_string()));
        }
        if reset_token.is_empty() {
            return Err(WardenError::InvalidInput("invalid reset token".to_string()));
        }
        let user = self
            .users
            .find_user_by(&UserQuery::ResetToken(reset_token.to_string()))
            .await?
            .ok_or_else(|| WardenError::InvalidInput("invalid reset token".to_string()))?;

        let password = new_password.to_string();
        let hash = blocking(move || hash_password(&password)).await?;
        let user = self
            .users
            .update_user(&user.id, UserUpdate::default().password(hash).reset_token(None))
            .await?;
        info!(user_id = %user.id, "Password updated");
        Ok(user.to_identity())
    }
}
