use crate::record_store::{RecordStore, SessionField};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use warden_core::{SessionRecord, WardenError, WardenResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user_sessions (
    session_id TEXT PRIMARY KEY NOT NULL,
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_user_sessions_user_id ON user_sessions (user_id);
";

/// SQLite-backed record store. The `user_sessions` table serves as both the
/// per-record index and the snapshot.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

type RawRow = (String, String, String);

impl SqliteRecordStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> WardenResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> WardenResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> WardenResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn select(&self, filter: Option<(SessionField, &str)>) -> WardenResult<Vec<SessionRecord>> {
        let conn = self.conn.lock();
        let rows = match filter {
            None => {
                let mut stmt = conn.prepare(
                    "SELECT session_id, user_id, created_at FROM user_sessions ORDER BY created_at",
                )?;
                let rows = stmt
                    .query_map([], raw_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            Some((field, value)) => {
                let sql = format!(
                    "SELECT session_id, user_id, created_at FROM user_sessions WHERE {} = ?1 ORDER BY created_at",
                    column(field)
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![value], raw_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        rows.into_iter().map(into_record).collect()
    }
}

fn column(field: SessionField) -> &'static str {
    match field {
        SessionField::SessionId => "session_id",
        SessionField::UserId => "user_id",
    }
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn into_record((session_id, user_id, created_at): RawRow) -> WardenResult<SessionRecord> {
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| WardenError::StorageUnavailable(format!("bad created_at {created_at:?}: {e}")))?
        .with_timezone(&Utc);
    Ok(SessionRecord {
        session_id,
        user_id,
        created_at,
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn upsert(&self, record: &SessionRecord) -> WardenResult<()> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO user_sessions (session_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                record.session_id,
                record.user_id,
                record.created_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> WardenResult<Option<SessionRecord>> {
        let raw = self
            .conn
            .lock()
            .query_row(
                "SELECT session_id, user_id, created_at FROM user_sessions WHERE session_id = ?1",
                params![session_id],
                raw_row,
            )
            .optional()?;
        raw.map(into_record).transpose()
    }

    async fn remove(&self, session_id: &str) -> WardenResult<bool> {
        let changed = self.conn.lock().execute(
            "DELETE FROM user_sessions WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(changed > 0)
    }

    async fn save_all(&self, records: &[SessionRecord]) -> WardenResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM user_sessions", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO user_sessions (session_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.session_id,
                    record.user_id,
                    record.created_at.to_rfc3339()
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn load_all(&self) -> WardenResult<Vec<SessionRecord>> {
        self.select(None)
    }

    async fn search(&self, field: SessionField, value: &str) -> WardenResult<Vec<SessionRecord>> {
        self.select(Some((field, value)))
    }
}
