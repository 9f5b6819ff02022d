use crate::expiring::ExpiringSessionPolicy;
use crate::policy::SessionPolicy;
use crate::record_store::RecordStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use warden_core::{SessionRecord, WardenError, WardenResult};

/// When the in-memory map is rebuilt from the durable snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadStrategy {
    /// Reload before every resolve, create and destroy. Sees writes made by
    /// other processes sharing the store.
    #[default]
    EveryLookup,
    /// Trust memory; every write goes through this policy so it stays coherent.
    WriteThrough,
}

/// Wraps an [`ExpiringSessionPolicy`] and mirrors its state into a [`RecordStore`].
///
/// Reload, mutate and save run under one lock, so writers in this process
/// never interleave. Across processes the snapshot is last-writer-wins.
pub struct PersistentSessionPolicy {
    inner: ExpiringSessionPolicy,
    records: Arc<dyn RecordStore>,
    reload: ReloadStrategy,
    write_lock: Mutex<()>,
}

impl PersistentSessionPolicy {
    /// Wrap `inner`, persisting to `records`. Call [`load`](Self::load) to
    /// pick up sessions saved by an earlier run.
    pub fn new(inner: ExpiringSessionPolicy, records: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            records,
            reload: ReloadStrategy::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Choose the reload strategy.
    pub fn with_reload(mut self, reload: ReloadStrategy) -> Self {
        self.reload = reload;
        self
    }

    /// The wrapped expiring policy.
    pub fn inner(&self) -> &ExpiringSessionPolicy {
        &self.inner
    }

    /// The durable mirror.
    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Rebuild memory from the durable snapshot. Returns the number of sessions loaded.
    pub async fn load(&self) -> WardenResult<usize> {
        let _guard = self.write_lock.lock().await;
        self.reload_from_snapshot().await
    }

    async fn reload_from_snapshot(&self) -> WardenResult<usize> {
        let records = self.records.load_all().await?;
        let count = records.len();
        self.inner.store().replace_all(records);
        debug!(count, "Sessions reloaded from snapshot");
        Ok(count)
    }

    async fn refresh(&self) -> WardenResult<()> {
        if self.reload == ReloadStrategy::EveryLookup {
            self.reload_from_snapshot().await?;
        }
        Ok(())
    }

    async fn persist_snapshot(&self) -> WardenResult<()> {
        self.records.save_all(&self.inner.store().snapshot()).await
    }

    async fn write_through(&self, record: &SessionRecord) -> WardenResult<()> {
        self.records.upsert(record).await?;
        self.persist_snapshot().await
    }

    /// Drop `session_id` from the durable mirror: the snapshot first, so a
    /// failed save leaves every copy of the session in place.
    async fn forget(&self, session_id: &str) -> WardenResult<()> {
        let remaining: Vec<SessionRecord> = self
            .inner
            .store()
            .snapshot()
            .into_iter()
            .filter(|r| r.session_id != session_id)
            .collect();
        self.records.save_all(&remaining).await?;
        self.inner.destroy(session_id);

        if let Err(e) = self.records.remove(session_id).await {
            warn!(error = %e, "Session dropped from snapshot but its record remains");
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionPolicy for PersistentSessionPolicy {
    async fn create(&self, user_id: &str) -> WardenResult<String> {
        let _guard = self.write_lock.lock().await;
        self.refresh().await?;

        let session_id = self.inner.create(user_id)?;
        let record = self
            .inner
            .store()
            .get(&session_id)
            .ok_or(WardenError::NotFound)?;

        if let Err(e) = self.write_through(&record).await {
            warn!(error = %e, "Failed to persist session, rolling back");
            self.inner.store().remove(&session_id);
            if let Err(rollback) = self.records.remove(&session_id).await {
                warn!(error = %rollback, "Failed to roll back persisted session record");
            }
            return Err(e);
        }

        info!(user_id = %user_id, "Session created");
        Ok(session_id)
    }

    async fn resolve(&self, session_id: &str) -> WardenResult<String> {
        let guard = match self.reload {
            ReloadStrategy::EveryLookup => {
                let guard = self.write_lock.lock().await;
                self.reload_from_snapshot().await?;
                Some(guard)
            }
            ReloadStrategy::WriteThrough => None,
        };

        match self.inner.resolve(session_id) {
            Err(WardenError::Expired) if self.inner.eager_purge() => {
                // The inner layer already dropped it from memory.
                let _guard = match guard {
                    Some(guard) => guard,
                    None => self.write_lock.lock().await,
                };
                self.forget(session_id).await?;
                debug!("Expired session purged from durable store");
                Err(WardenError::Expired)
            }
            result => result,
        }
    }

    async fn destroy(&self, session_id: &str) -> WardenResult<bool> {
        let _guard = self.write_lock.lock().await;
        self.refresh().await?;

        let user_id = match self.inner.resolve(session_id) {
            Ok(user_id) => user_id,
            Err(e) if e.is_session_miss() => return Ok(false),
            Err(e) => return Err(e),
        };

        self.forget(session_id).await?;

        info!(user_id = %user_id, "Session destroyed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_store::MemoryRecordStore;
    use crate::store::SessionStore;
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};
    use warden_core::{Clock, ManualClock, SessionDuration};

    /// Memory-backed records whose snapshot writes can be switched off.
    #[derive(Default)]
    struct FlakySnapshots {
        inner: MemoryRecordStore,
        fail_saves: AtomicBool,
        fail_removes: AtomicBool,
    }

    #[async_trait]
    impl RecordStore for FlakySnapshots {
        async fn upsert(&self, record: &SessionRecord) -> WardenResult<()> {
            self.inner.upsert(record).await
        }

        async fn get(&self, session_id: &str) -> WardenResult<Option<SessionRecord>> {
            self.inner.get(session_id).await
        }

        async fn remove(&self, session_id: &str) -> WardenResult<bool> {
            if self.fail_removes.load(Ordering::SeqCst) {
                return Err(WardenError::StorageUnavailable("read-only".into()));
            }
            self.inner.remove(session_id).await
        }

        async fn save_all(&self, records: &[SessionRecord]) -> WardenResult<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(WardenError::StorageUnavailable("disk full".into()));
            }
            self.inner.save_all(records).await
        }

        async fn load_all(&self) -> WardenResult<Vec<SessionRecord>> {
            self.inner.load_all().await
        }
    }

    fn policy(
        ttl: i64,
        records: Arc<dyn RecordStore>,
        clock: Arc<ManualClock>,
    ) -> PersistentSessionPolicy {
        let store = SessionStore::with_clock(clock);
        PersistentSessionPolicy::new(
            ExpiringSessionPolicy::new(store, SessionDuration::from_secs(ttl)),
            records,
        )
    }

    #[tokio::test]
    async fn test_create_writes_record_and_snapshot() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let policy = policy(0, records.clone(), Arc::new(ManualClock::default()));

        let id = policy.create("u1").await.unwrap();
        assert_eq!(records.get(&id).await.unwrap().unwrap().user_id, "u1");
        assert_eq!(records.load_all().await.unwrap().len(), 1);
        assert_eq!(policy.resolve(&id).await.unwrap(), "u1");
    }

    #[tokio::test]
    async fn test_destroy_requires_live_session() {
        let clock = Arc::new(ManualClock::default());
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let policy = policy(10, records.clone(), clock.clone());

        let live = policy.create("u1").await.unwrap();
        assert!(policy.destroy(&live).await.unwrap());
        assert!(!policy.destroy(&live).await.unwrap());
        assert!(records.get(&live).await.unwrap().is_none());

        let stale = policy.create("u2").await.unwrap();
        clock.advance(Duration::seconds(11));
        assert!(!policy.destroy(&stale).await.unwrap());
        assert!(matches!(
            policy.resolve(&stale).await,
            Err(WardenError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_every_lookup_sees_external_writes() {
        let clock = Arc::new(ManualClock::default());
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let policy = policy(0, records.clone(), clock.clone());

        records
            .save_all(&[SessionRecord::new("external", "u9", clock.now())])
            .await
            .unwrap();
        assert_eq!(policy.resolve("external").await.unwrap(), "u9");
    }

    #[tokio::test]
    async fn test_write_through_trusts_memory() {
        let clock = Arc::new(ManualClock::default());
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let policy =
            policy(0, records.clone(), clock.clone()).with_reload(ReloadStrategy::WriteThrough);

        records
            .save_all(&[SessionRecord::new("external", "u9", clock.now())])
            .await
            .unwrap();
        assert!(matches!(
            policy.resolve("external").await,
            Err(WardenError::NotFound)
        ));

        assert_eq!(policy.load().await.unwrap(), 1);
        assert_eq!(policy.resolve("external").await.unwrap(), "u9");
    }

    #[tokio::test]
    async fn test_invalid_user_is_not_persisted() {
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let policy = policy(0, records.clone(), Arc::new(ManualClock::default()));

        assert!(matches!(
            policy.create("").await,
            Err(WardenError::InvalidInput(_))
        ));
        assert!(records.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_snapshot_on_destroy_keeps_session_everywhere() {
        let records = Arc::new(FlakySnapshots::default());
        let policy = policy(0, records.clone(), Arc::new(ManualClock::default()));
        let id = policy.create("u1").await.unwrap();

        records.fail_saves.store(true, Ordering::SeqCst);
        assert!(matches!(
            policy.destroy(&id).await,
            Err(WardenError::StorageUnavailable(_))
        ));
        assert!(records.get(&id).await.unwrap().is_some());
        assert!(policy.inner().store().get(&id).is_some());
        assert_eq!(records.load_all().await.unwrap().len(), 1);

        records.fail_saves.store(false, Ordering::SeqCst);
        assert!(policy.destroy(&id).await.unwrap());
        assert!(records.get(&id).await.unwrap().is_none());
        assert!(matches!(
            policy.resolve(&id).await,
            Err(WardenError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_eager_purge_reaches_durable_store() {
        for reload in [ReloadStrategy::EveryLookup, ReloadStrategy::WriteThrough] {
            let clock = Arc::new(ManualClock::default());
            let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
            let store = SessionStore::with_clock(clock.clone());
            let policy = PersistentSessionPolicy::new(
                ExpiringSessionPolicy::new(store, SessionDuration::from_secs(1))
                    .with_eager_purge(true),
                records.clone(),
            )
            .with_reload(reload);

            let id = policy.create("u1").await.unwrap();
            clock.advance(Duration::seconds(5));

            assert!(matches!(
                policy.resolve(&id).await,
                Err(WardenError::Expired)
            ));
            assert!(matches!(
                policy.resolve(&id).await,
                Err(WardenError::NotFound)
            ));
            assert!(records.load_all().await.unwrap().is_empty(), "{reload:?}");
            assert!(records.get(&id).await.unwrap().is_none(), "{reload:?}");
        }
    }

    #[tokio::test]
    async fn test_expired_record_kept_without_eager_purge() {
        let clock = Arc::new(ManualClock::default());
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let policy = policy(1, records.clone(), clock.clone());

        let id = policy.create("u1").await.unwrap();
        clock.advance(Duration::seconds(5));
        for _ in 0..2 {
            assert!(matches!(
                policy.resolve(&id).await,
                Err(WardenError::Expired)
            ));
        }
        assert_eq!(records.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_rollback_still_reports_original_error() {
        let records = Arc::new(FlakySnapshots::default());
        records.fail_saves.store(true, Ordering::SeqCst);
        records.fail_removes.store(true, Ordering::SeqCst);
        let policy = policy(0, records.clone(), Arc::new(ManualClock::default()));

        match policy.create("u1").await {
            Err(WardenError::StorageUnavailable(msg)) => assert_eq!(msg, "disk full"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(policy.inner().store().is_empty());
    }
}
