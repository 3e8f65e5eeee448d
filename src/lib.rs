//! Per-user movie favorites kept in a synchronous key-value store.
//!
//! A [`FavoritesStore`] is built from a [`KeyValueStore`] (a `sled::Db` or the
//! in-memory [`MemoryStorage`]) and a [`SessionProvider`] that names the
//! signed-in user. Each user's favorites are stored as a JSON array under
//! `favorites_<username>`.

pub mod config;
pub mod error;
pub mod favorites;
pub mod model;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{ConfigError, FavoritesError, RecordError, SessionError};
pub use favorites::{storage_key, AddOutcome, FavoritesStore};
pub use model::*;
pub use session::{SessionProvider, StoredSession};
pub use storage::{KeyValueStore, MemoryStorage, MemoryStorageError};
