use crate::model::{User, UserQuery, UserUpdate};
use crate::store::{validate_new_user, UserStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use warden_core::{Clock, SystemClock, WardenError, WardenResult};

/// User store held in process memory, keyed by id.
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    /// Empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty store stamping times from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn add_user(&self, email: &str, hashed_password: &str) -> WardenResult<User> {
        validate_new_user(email, hashed_password)?;
        let mut users = self.users.write();
        if users.values().any(|u| u.email == email) {
            return Err(WardenError::AlreadyRegistered(email.to_string()));
        }
        let user = User::new(email, hashed_password, self.clock.now());
        users.insert(user.id.clone(), user.clone());
        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn find_user_by(&self, query: &UserQuery) -> WardenResult<Option<User>> {
        let users = self.users.read();
        if let UserQuery::Id(id) = query {
            return Ok(users.get(id).cloned());
        }
        Ok(users.values().find(|u| query.matches(u)).cloned())
    }

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> WardenResult<User> {
        let mut users = self.users.write();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| WardenError::UserNotFound(user_id.to_string()))?;
        user.apply(update, self.clock.now());
        Ok(user.clone())
    }

    async fn remove(&self, user_id: &str) -> WardenResult<bool> {
        Ok(self.users.write().remove(user_id).is_some())
    }

    async fn all(&self) -> WardenResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}
