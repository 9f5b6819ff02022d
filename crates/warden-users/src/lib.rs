//! User records and their stores for the Warden session authentication service.
//!
//! # Main types
//!
//! - [`User`] — A registered account, including its password hash.
//! - [`UserStore`] — Async trait over user persistence.
//! - [`InMemoryUserStore`] — Process-local store.
//! - [`SqliteUserStore`] — SQLite-backed store (feature `sqlite`).

/// Store selection from configuration.
pub mod config;
/// In-memory user store.
pub mod memory;
/// User model and update/query types.
pub mod model;
/// SQLite user store.
#[cfg(feature = "sqlite")]
pub mod sqlite;
/// The user store trait.
pub mod store;

pub use config::{build_user_store, UsersBackend, UsersConfig};
pub use memory::InMemoryUserStore;
pub use model::{User, UserQuery, UserUpdate};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteUserStore;
pub use store::UserStore;
