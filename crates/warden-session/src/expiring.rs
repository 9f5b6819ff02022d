use crate::policy::SessionPolicy;
use crate::store::SessionStore;
use async_trait::async_trait;
use tracing::debug;
use warden_core::{SessionDuration, SessionRecord, WardenError, WardenResult};

/// Wraps a [`SessionStore`] with a time-to-live check.
///
/// An expired record is left in place unless eager purging is switched on;
/// `destroy` still removes it.
pub struct ExpiringSessionPolicy {
    store: SessionStore,
    duration: SessionDuration,
    eager_purge: bool,
}

impl ExpiringSessionPolicy {
    /// Wrap `store`, expiring sessions after `duration`.
    pub fn new(store: SessionStore, duration: SessionDuration) -> Self {
        Self {
            store,
            duration,
            eager_purge: false,
        }
    }

    /// Remove a record on the resolve that finds it expired.
    pub fn with_eager_purge(mut self, eager_purge: bool) -> Self {
        self.eager_purge = eager_purge;
        self
    }

    /// Whether expired records are removed when a resolve finds them.
    pub fn eager_purge(&self) -> bool {
        self.eager_purge
    }

    /// The configured time-to-live.
    pub fn duration(&self) -> SessionDuration {
        self.duration
    }

    /// The wrapped store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Issue a token; the record is stamped with the store's clock.
    pub fn create(&self, user_id: &str) -> WardenResult<String> {
        self.store.create(user_id)
    }

    /// Resolve `session_id`, enforcing the time-to-live.
    pub fn resolve(&self, session_id: &str) -> WardenResult<String> {
        let record = self.store.get(session_id).ok_or(WardenError::NotFound)?;
        self.check(&record)?;
        Ok(record.user_id)
    }

    /// Remove `session_id` whether or not it has expired.
    pub fn destroy(&self, session_id: &str) -> bool {
        self.store.remove(session_id)
    }

    fn check(&self, record: &SessionRecord) -> WardenResult<()> {
        let now = self.store.clock().now();
        if !record.is_expired_at(now, self.duration) {
            return Ok(());
        }

        debug!(
            created_at = %record.created_at,
            ttl_secs = self.duration.as_secs(),
            "Session expired"
        );
        if self.eager_purge {
            self.store.remove(&record.session_id);
        }
        Err(WardenError::Expired)
    }
}

#[async_trait]
impl SessionPolicy for ExpiringSessionPolicy {
    async fn create(&self, user_id: &str) -> WardenResult<String> {
        ExpiringSessionPolicy::create(self, user_id)
    }

    async fn resolve(&self, session_id: &str) -> WardenResult<String> {
        ExpiringSessionPolicy::resolve(self, session_id)
    }

    async fn destroy(&self, session_id: &str) -> WardenResult<bool> {
        Ok(ExpiringSessionPolicy::destroy(self, session_id))
    }
}
