use crate::model::{User, UserQuery, UserUpdate};
use crate::store::{validate_new_user, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use warden_core::{Clock, SystemClock, WardenError, WardenResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    first_name      TEXT,
    last_name       TEXT,
    reset_token     TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
";

const COLUMNS: &str =
    "id, email, hashed_password, first_name, last_name, reset_token, created_at, updated_at";

/// User store over a SQLite `users` table.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

struct RawUser {
    id: String,
    email: String,
    hashed_password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    reset_token: Option<String>,
    created_at: String,
    updated_at: String,
}

impl SqliteUserStore {
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
            clock: Arc::new(SystemClock),
        })
    }

    /// Stamp times from `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

fn raw_user(row: &Row<'_>) -> rusqlite::Result<RawUser> {
    Ok(RawUser {
        id: row.get(0)?,
        email: row.get(1)?,
        hashed_password: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        reset_token: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn parse_time(value: &str) -> WardenResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| WardenError::StorageUnavailable(format!("bad timestamp {value:?}: {e}")))
}

fn into_user(raw: RawUser) -> WardenResult<User> {
    Ok(User {
        created_at: parse_time(&raw.created_at)?,
        updated_at: parse_time(&raw.updated_at)?,
        id: raw.id,
        email: raw.email,
        hashed_password: raw.hashed_password,
        first_name: raw.first_name,
        last_name: raw.last_name,
        reset_token: raw.reset_token,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn find(conn: &Connection, query: &UserQuery) -> WardenResult<Option<User>> {
    let (column, value) = match query {
        UserQuery::Id(v) => ("id", v),
        UserQuery::Email(v) => ("email", v),
        UserQuery::ResetToken(v) => ("reset_token", v),
    };
    let sql = format!("SELECT {COLUMNS} FROM users WHERE {column} = ?1 LIMIT 1");
    let raw = conn.query_row(&sql, params![value], raw_user).optional()?;
    raw.map(into_user).transpose()
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn add_user(&self, email: &str, hashed_password: &str) -> WardenResult<User> {
        validate_new_user(email, hashed_password)?;
        let user = User::new(email, hashed_password, self.clock.now());
        let inserted = self.conn.lock().execute(
            &format!("INSERT INTO users ({COLUMNS}) VALUES (?1, ?2, ?3, NULL, NULL, NULL, ?4, ?4)"),
            params![
                user.id,
                user.email,
                user.hashed_password,
                user.created_at.to_rfc3339()
            ],
        );
        match inserted {
            Ok(_) => {
                info!(user_id = %user.id, "User registered");
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => Err(WardenError::AlreadyRegistered(email.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by(&self, query: &UserQuery) -> WardenResult<Option<User>> {
        find(&self.conn.lock(), query)
    }

    async fn update_user(&self, user_id: &str, update: UserUpdate) -> WardenResult<User> {
        let conn = self.conn.lock();
        let mut user = find(&conn, &UserQuery::Id(user_id.to_string()))?
            .ok_or_else(|| WardenError::UserNotFound(user_id.to_string()))?;
        user.apply(update, self.clock.now());
        conn.execute(
            "UPDATE users SET hashed_password = ?2, first_name = ?3, last_name = ?4,
                reset_token = ?5, updated_at = ?6 WHERE id = ?1",
            params![
                user.id,
                user.hashed_password,
                user.first_name,
                user.last_name,
                user.reset_token,
                user.updated_at.to_rfc3339()
            ],
        )?;
        Ok(user)
    }

    async fn remove(&self, user_id: &str) -> WardenResult<bool> {
        let changed = self
            .conn
            .lock()
            .execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        Ok(changed > 0)
    }

    async fn all(&self) -> WardenResult<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM users ORDER BY created_at"))?;
        let rows = stmt
            .query_map([], raw_user)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(into_user).collect()
    }
}
