use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use warden_core::{SessionRecord, WardenError, WardenResult};

/// Field a [`RecordStore::search`] can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    /// The session token.
    SessionId,
    /// The owning user.
    UserId,
}

impl SessionField {
    fn matches(self, record: &SessionRecord, value: &str) -> bool {
        match self {
            SessionField::SessionId => record.session_id == value,
            SessionField::UserId => record.user_id == value,
        }
    }
}

/// Durable mirror of the session map.
///
/// Holds both per-record entries (incremental writes, keyed reads) and a
/// full snapshot (bulk save/load for restart recovery).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or overwrite one record.
    async fn upsert(&self, record: &SessionRecord) -> WardenResult<()>;

    /// Read one record.
    async fn get(&self, session_id: &str) -> WardenResult<Option<SessionRecord>>;

    /// Delete one record. Returns whether it existed.
    async fn remove(&self, session_id: &str) -> WardenResult<bool>;

    /// Replace the snapshot with `records`.
    async fn save_all(&self, records: &[SessionRecord]) -> WardenResult<()>;

    /// Read the snapshot. An absent snapshot is empty, not an error.
    async fn load_all(&self) -> WardenResult<Vec<SessionRecord>>;

    /// Snapshot records whose `field` equals `value`.
    async fn search(&self, field: SessionField, value: &str) -> WardenResult<Vec<SessionRecord>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|r| field.matches(r, value))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryRecordStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    records: HashMap<String, SessionRecord>,
    snapshot: Vec<SessionRecord>,
}

/// Record store that lives only as long as the process.
#[derive(Default)]
pub struct MemoryRecordStore {
    state: Mutex<MemoryState>,
}

impl MemoryRecordStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(&self, record: &SessionRecord) -> WardenResult<()> {
        self.state
            .lock()
            .records
            .insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> WardenResult<Option<SessionRecord>> {
        Ok(self.state.lock().records.get(session_id).cloned())
    }

    async fn remove(&self, session_id: &str) -> WardenResult<bool> {
        Ok(self.state.lock().records.remove(session_id).is_some())
    }

    async fn save_all(&self, records: &[SessionRecord]) -> WardenResult<()> {
        self.state.lock().snapshot = records.to_vec();
        Ok(())
    }

    async fn load_all(&self) -> WardenResult<Vec<SessionRecord>> {
        Ok(self.state.lock().snapshot.clone())
    }
}

// ---------------------------------------------------------------------------
// FileRecordStore
// ---------------------------------------------------------------------------

const SNAPSHOT_FILE: &str = "sessions.json";
const RECORDS_DIR: &str = "records";

/// File-based record store: `records/<session_id>.json` plus a `sessions.json` snapshot.
pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn new(dir: PathBuf) -> WardenResult<Self> {
        tokio::fs::create_dir_all(dir.join(RECORDS_DIR)).await?;
        Ok(Self { dir })
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn record_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(RECORDS_DIR).join(format!("{session_id}.json"))
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }
}

/// Session ids reach this store straight from cookies; only plain tokens may name a file.
fn is_safe_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn upsert(&self, record: &SessionRecord) -> WardenResult<()> {
        if !is_safe_id(&record.session_id) {
            return Err(WardenError::InvalidInput(format!(
                "session id {:?} is not a valid token",
                record.session_id
            )));
        }
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(self.record_path(&record.session_id), json).await?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> WardenResult<Option<SessionRecord>> {
        if !is_safe_id(session_id) {
            return Ok(None);
        }
        match tokio::fs::read_to_string(self.record_path(session_id)).await {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, session_id: &str) -> WardenResult<bool> {
        if !is_safe_id(session_id) {
            return Ok(false);
        }
        match tokio::fs::remove_file(self.record_path(session_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_all(&self, records: &[SessionRecord]) -> WardenResult<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.dir.join(format!("{SNAPSHOT_FILE}.tmp"));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, self.snapshot_path()).await?;
        Ok(())
    }

    async fn load_all(&self) -> WardenResult<Vec<SessionRecord>> {
        match tokio::fs::read_to_string(self.snapshot_path()).await {
            Ok(data) if data.trim().is_empty() => Ok(Vec::new()),
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn file_store() -> (FileRecordStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = FileRecordStore::new(tmp.path().join("sessions")).await.unwrap();
        (store, tmp)
    }

    fn record(id: &str, user: &str) -> SessionRecord {
        SessionRecord::new(id, user, Utc::now())
    }

    #[tokio::test]
    async fn test_upsert_get_remove() {
        let (store, _tmp) = file_store().await;
        let r = record("abc-123", "u1");

        store.upsert(&r).await.unwrap();
        assert_eq!(store.get("abc-123").await.unwrap(), Some(r));

        assert!(store.remove("abc-123").await.unwrap());
        assert!(!store.remove("abc-123").await.unwrap());
        assert!(store.get("abc-123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let (store, _tmp) = file_store().await;
        assert!(store.load_all().await.unwrap().is_empty());

        let records = vec![record("a", "u1"), record("b", "u2")];
        store.save_all(&records).await.unwrap();
        assert_eq!(store.load_all().await.unwrap(), records);

        store.save_all(&[]).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_user() {
        let (store, _tmp) = file_store().await;
        store
            .save_all(&[record("a", "u1"), record("b", "u2"), record("c", "u1")])
            .await
            .unwrap();

        let hits = store.search(SessionField::UserId, "u1").await.unwrap();
        assert_eq!(hits.len(), 2);
        let hits = store.search(SessionField::SessionId, "b").await.unwrap();
        assert_eq!(hits[0].user_id, "u2");
    }

    #[tokio::test]
    async fn test_path_like_ids_are_absent() {
        let (store, tmp) = file_store().await;
        tokio::fs::write(tmp.path().join("secret.json"), "{}")
            .await
            .unwrap();

        assert!(store.get("../../secret").await.unwrap().is_none());
        assert!(!store.remove("../secret").await.unwrap());
        assert!(matches!(
            store.upsert(&record("../x", "u1")).await,
            Err(WardenError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_storage_error() {
        let (store, _tmp) = file_store().await;
        tokio::fs::write(store.dir().join(SNAPSHOT_FILE), "not json")
            .await
            .unwrap();
        assert!(matches!(
            store.load_all().await,
            Err(WardenError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_keeps_records_and_snapshot_apart() {
        let store = MemoryRecordStore::new();
        store.upsert(&record("a", "u1")).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());

        store.save_all(&[record("a", "u1")]).await.unwrap();
        assert_eq!(store.load_all().await.unwrap().len(), 1);
        assert!(store.remove("a").await.unwrap());
    }
}
