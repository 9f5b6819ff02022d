use crate::expiring::ExpiringSessionPolicy;
use crate::persistent::{PersistentSessionPolicy, ReloadStrategy};
use crate::policy::SessionPolicy;
use crate::record_store::{FileRecordStore, RecordStore};
use crate::store::SessionStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use warden_core::{Clock, SessionDuration, WardenError, WardenResult};

/// Which layers of the session chain to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    /// Bare in-memory store, no expiry.
    Memory,
    /// In-memory store with a time-to-live.
    #[default]
    Expiring,
    /// Expiring store mirrored to JSON files.
    File,
    /// Expiring store mirrored to a SQLite table.
    Sqlite,
}

impl FromStr for SessionBackend {
    type Err = WardenError;

    /// Accepts the backend names as well as the legacy `AUTH_TYPE` values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "memory" | "session_auth" => Ok(SessionBackend::Memory),
            "expiring" | "session_exp_auth" => Ok(SessionBackend::Expiring),
            "file" | "session_db_auth" => Ok(SessionBackend::File),
            "sqlite" => Ok(SessionBackend::Sqlite),
            other => Err(WardenError::Config(format!("unknown session backend {other:?}"))),
        }
    }
}

/// Session settings, as read from the `[session]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Chain to build.
    pub backend: SessionBackend,
    /// Time-to-live in seconds; 0 means never expire.
    pub duration_secs: i64,
    /// Snapshot reload strategy for persistent backends.
    pub reload: ReloadStrategy,
    /// Drop expired records on the resolve that notices them.
    pub eager_purge: bool,
    /// Where persistent backends keep their files.
    pub data_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            duration_secs: 0,
            reload: ReloadStrategy::default(),
            eager_purge: false,
            data_dir: PathBuf::from("./data/sessions"),
        }
    }
}

impl SessionConfig {
    /// The configured time-to-live.
    pub fn duration(&self) -> SessionDuration {
        SessionDuration::from_secs(self.duration_secs)
    }
}

/// Assemble the session chain described by `config`.
///
/// Persistent backends load their snapshot before returning, so sessions
/// issued by a previous run resolve immediately.
pub async fn build_policy(
    config: &SessionConfig,
    clock: Arc<dyn Clock>,
) -> WardenResult<Arc<dyn SessionPolicy>> {
    let store = SessionStore::with_clock(clock);
    let expiring = |store| {
        ExpiringSessionPolicy::new(store, config.duration()).with_eager_purge(config.eager_purge)
    };

    let policy: Arc<dyn SessionPolicy> = match config.backend {
        SessionBackend::Memory => Arc::new(store),
        SessionBackend::Expiring => Arc::new(expiring(store)),
        SessionBackend::File => {
            let records = Arc::new(FileRecordStore::new(config.data_dir.clone()).await?);
            Arc::new(persistent(expiring(store), records, config.reload).await?)
        }
        SessionBackend::Sqlite => {
            let records = open_sqlite(config).await?;
            Arc::new(persistent(expiring(store), records, config.reload).await?)
        }
    };

    info!(
        backend = ?config.backend,
        ttl_secs = config.duration_secs,
        "Session policy ready"
    );
    Ok(policy)
}

async fn persistent(
    inner: ExpiringSessionPolicy,
    records: Arc<dyn RecordStore>,
    reload: ReloadStrategy,
) -> WardenResult<PersistentSessionPolicy> {
    let policy = PersistentSessionPolicy::new(inner, records).with_reload(reload);
    let loaded = policy.load().await?;
    info!(loaded, "Restored sessions from durable store");
    Ok(policy)
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(config: &SessionConfig) -> WardenResult<Arc<dyn RecordStore>> {
    tokio::fs::create_dir_all(&config.data_dir).await?;
    let store = crate::sqlite::SqliteRecordStore::open(config.data_dir.join("sessions.db"))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_config: &SessionConfig) -> WardenResult<Arc<dyn RecordStore>> {
    Err(WardenError::Config(
        "sqlite session backend requires the `sqlite` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use warden_core::{ManualClock, SystemClock};

    #[test]
    fn test_backend_names() {
        assert_eq!("memory".parse::<SessionBackend>().unwrap(), SessionBackend::Memory);
        assert_eq!(
            "session_exp_auth".parse::<SessionBackend>().unwrap(),
            SessionBackend::Expiring
        );
        assert_eq!(
            "session_db_auth".parse::<SessionBackend>().unwrap(),
            SessionBackend::File
        );
        assert!("basic_auth".parse::<SessionBackend>().is_err());
    }

    #[test]
    fn test_config_partial_fields_use_defaults() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"backend": "file", "duration_secs": 60, "reload": "write_through"}"#,
        )
        .unwrap();
        assert_eq!(config.backend, SessionBackend::File);
        assert_eq!(config.duration().as_secs(), 60);
        assert_eq!(config.reload, ReloadStrategy::WriteThrough);
        assert!(!config.eager_purge);
    }

    #[tokio::test]
    async fn test_build_file_policy_restores_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            backend: SessionBackend::File,
            data_dir: tmp.path().join("sessions"),
            ..SessionConfig::default()
        };

        let first = build_policy(&config, Arc::new(SystemClock)).await.unwrap();
        let id = first.create("u1").await.unwrap();
        drop(first);

        let second = build_policy(&config, Arc::new(SystemClock)).await.unwrap();
        assert_eq!(second.resolve(&id).await.unwrap(), "u1");
    }

    #[tokio::test]
    async fn test_file_backend_eager_purge_clears_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sessions");
        let clock = Arc::new(ManualClock::default());
        let config = SessionConfig {
            backend: SessionBackend::File,
            duration_secs: 1,
            eager_purge: true,
            data_dir: dir.clone(),
            ..SessionConfig::default()
        };

        let policy = build_policy(&config, clock.clone()).await.unwrap();
        let id = policy.create("u1").await.unwrap();
        clock.advance(Duration::seconds(5));

        assert!(matches!(policy.resolve(&id).await, Err(WardenError::Expired)));
        assert!(matches!(policy.resolve(&id).await, Err(WardenError::NotFound)));

        let records = FileRecordStore::new(dir).await.unwrap();
        assert!(records.load_all().await.unwrap().is_empty());
        assert!(records.get(&id).await.unwrap().is_none());
    }
}
