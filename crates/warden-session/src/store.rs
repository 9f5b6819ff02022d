use crate::policy::SessionPolicy;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use warden_core::{Clock, SessionRecord, SystemClock, WardenError, WardenResult};

/// In-memory session map. The leaf of the policy chain; knows nothing about expiry.
///
/// Constructed once and handed to whichever policy wraps it; there is no
/// process-wide instance.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Empty store stamping records with the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty store stamping records with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// The clock records are stamped with.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Issue a fresh token for `user_id` and remember it.
    pub fn create(&self, user_id: &str) -> WardenResult<String> {
        if user_id.trim().is_empty() {
            return Err(WardenError::InvalidInput("user_id is required".to_string()));
        }

        let now = self.clock.now();
        let mut sessions = self.sessions.write();
        let mut session_id = Uuid::new_v4().to_string();
        while sessions.contains_key(&session_id) {
            debug!("Session id collision, regenerating");
            session_id = Uuid::new_v4().to_string();
        }
        sessions.insert(
            session_id.clone(),
            SessionRecord::new(session_id.clone(), user_id, now),
        );
        Ok(session_id)
    }

    /// User id for `session_id`, or `NotFound`.
    pub fn lookup(&self, session_id: &str) -> WardenResult<String> {
        self.sessions
            .read()
            .get(session_id)
            .map(|r| r.user_id.clone())
            .ok_or(WardenError::NotFound)
    }

    /// Full record for `session_id`.
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Insert or overwrite a record as-is.
    pub fn insert(&self, record: SessionRecord) {
        self.sessions
            .write()
            .insert(record.session_id.clone(), record);
    }

    /// Drop `session_id`. Returns whether anything was removed.
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    /// Swap the whole map for `records`.
    pub fn replace_all(&self, records: Vec<SessionRecord>) {
        let map = records
            .into_iter()
            .map(|r| (r.session_id.clone(), r))
            .collect();
        *self.sessions.write() = map;
    }

    /// Copy of every record.
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        self.sessions.read().values().cloned().collect()
    }

    /// Number of live entries (expired ones included).
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// True when no sessions are held.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionPolicy for SessionStore {
    async fn create(&self, user_id: &str) -> WardenResult<String> {
        SessionStore::create(self, user_id)
    }

    async fn resolve(&self, session_id: &str) -> WardenResult<String> {
        self.lookup(session_id)
    }

    async fn destroy(&self, session_id: &str) -> WardenResult<bool> {
        Ok(self.remove(session_id))
    }
}
