//! Key-value store contract with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Provide `get_item`/`set_item` semantics over a durable local store.
//! - Run blocking SQLite calls off the async executor.
//!
//! # Invariants
//! - A missing key reads as `None`, never as an error.
//! - Writes upsert the row for `key` and bump `updated_at`.

use crate::db::{open_db, DbError};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of the key-value collaborator.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Background blocking task was cancelled or panicked.
    Task(String),
    /// Store refused the operation (used by non-SQLite backends).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Task(message) => write!(f, "store task failed: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Task(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Async key-value collaborator used by the persistence bridge.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// SQLite-backed store over the `kv_store` table.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    /// Wraps a connection that already has the schema applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens the database file at `path` and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&*guard)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1;",
                    [key.as_str()],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, value],
            )?;
            Ok(())
        })
        .await
    }
}

/// Process-local store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or overwrites one value synchronously.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.items.lock().insert(key.into(), value.into());
    }

    /// Reads one value synchronously.
    pub fn get(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
    use crate::db::open_db_in_memory;

    #[tokio::test]
    async fn sqlite_store_reads_missing_key_as_none() {
        let store = SqliteKeyValueStore::new(open_db_in_memory().unwrap());
        assert_eq!(store.get_item("addresses").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sqlite_store_overwrites_existing_key() {
        let store = SqliteKeyValueStore::new(open_db_in_memory().unwrap());

        store.set_item("addresses", "[1]").await.unwrap();
        store.set_item("addresses", "[2]").await.unwrap();

        assert_eq!(
            store.get_item("addresses").await.unwrap().as_deref(),
            Some("[2]")
        );
    }

    #[tokio::test]
    async fn memory_store_round_trips_values() {
        let store = MemoryKeyValueStore::new();
        store.set_item("k", "v").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("missing"), None);
    }
}
