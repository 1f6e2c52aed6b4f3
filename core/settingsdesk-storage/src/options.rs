//! Key/value option persistence.

use crate::error::{StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// The host's persistent option store.
pub trait OptionStore: Send + Sync {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Reads `key`, falling back to `default` when nothing is stored.
    fn get_or(&self, key: &str, default: Value) -> StorageResult<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &Value) -> StorageResult<()>;
}

impl<T: OptionStore + ?Sized> OptionStore for Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> StorageResult<()> {
        (**self).set(key, value)
    }
}

/// Process-local option store.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_values<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: Mutex::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let values = self.values.lock().map_err(|_| StorageError::Lock("options"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> StorageResult<()> {
        let mut values = self.values.lock().map_err(|_| StorageError::Lock("options"))?;
        values.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Option store backed by a SQLite file. Values are kept as JSON text.
pub struct SqliteOptionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOptionStore {
    /// Opens (or creates) an option store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory option store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.conn.lock().map_err(|_| StorageError::Lock("sqlite options"))?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS options (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

impl OptionStore for SqliteOptionStore {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let conn = self.conn.lock().map_err(|_| StorageError::Lock("sqlite options"))?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM options WHERE name = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|text| serde_json::from_str::<Value>(&text))
            .transpose()
            .map_err(Into::into)
    }

    fn set(&self, key: &str, value: &Value) -> StorageResult<()> {
        let text = serde_json::to_string(value)?;
        let conn = self.conn.lock().map_err(|_| StorageError::Lock("sqlite options"))?;
        conn.execute(
            "INSERT INTO options (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![key, text],
        )?;
        debug!(option = key, bytes = text.len(), "Option written");
        Ok(())
    }
}
