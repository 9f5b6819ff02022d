//! Session management for Warden.
//!
//! Sessions are handled by a chain of decorators over one trait,
//! [`SessionPolicy`]:
//!
//! - [`SessionStore`] — in-memory map from token to [`SessionRecord`](warden_core::SessionRecord).
//! - [`ExpiringSessionPolicy`] — adds a time-to-live check.
//! - [`PersistentSessionPolicy`] — mirrors state into a [`RecordStore`].
//!
//! [`build_policy`] assembles the chain from a [`SessionConfig`].

pub mod config;
pub mod expiring;
pub mod persistent;
pub mod policy;
pub mod record_store;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod store;

pub use config::{build_policy, SessionBackend, SessionConfig};
pub use expiring::ExpiringSessionPolicy;
pub use persistent::{PersistentSessionPolicy, ReloadStrategy};
pub use policy::SessionPolicy;
pub use record_store::{FileRecordStore, MemoryRecordStore, RecordStore, SessionField};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordStore;
pub use store::SessionStore;
