use crate::memory::InMemoryUserStore;
use crate::store::UserStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use warden_core::{Clock, WardenResult};

/// Where user accounts live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsersBackend {
    /// Lost on restart.
    Memory,
    /// `users.db` under the data directory.
    #[default]
    Sqlite,
}

/// The `[users]` config section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    /// Store to open.
    pub backend: UsersBackend,
}

/// Open the configured user store. SQLite databases go in `data_dir/users.db`.
pub async fn build_user_store(
    config: &UsersConfig,
    data_dir: &Path,
    clock: Arc<dyn Clock>,
) -> WardenResult<Arc<dyn UserStore>> {
    let store: Arc<dyn UserStore> = match config.backend {
        UsersBackend::Memory => Arc::new(InMemoryUserStore::with_clock(clock)),
        UsersBackend::Sqlite => open_sqlite(data_dir, clock).await?,
    };
    info!(backend = ?config.backend, "User store ready");
    Ok(store)
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(data_dir: &Path, clock: Arc<dyn Clock>) -> WardenResult<Arc<dyn UserStore>> {
    tokio::fs::create_dir_all(data_dir).await?;
    let store = crate::sqlite::SqliteUserStore::open(data_dir.join("users.db"))?.with_clock(clock);
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_data_dir: &Path, _clock: Arc<dyn Clock>) -> WardenResult<Arc<dyn UserStore>> {
    Err(warden_core::WardenError::Config(
        "sqlite user backend requires the `sqlite` feature".to_string(),
    ))
}
