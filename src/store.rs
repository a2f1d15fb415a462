use crate::errors::{AppError, AppResult};
use crate::models::Business;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// The single key under which the whole business collection is persisted.
pub const BUSINESSES_KEY: &str = "businesses";

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)";

/// Opaque key-value string store. The rest of the application never sees the
/// medium behind it.
pub trait StringStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

impl<S: StringStore + ?Sized> StringStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        (**self).set(key, value)
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("store mutex poisoned".to_string()))
    }
}

impl StringStore for SqliteStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-memory store used as the injectable fake in tests. `fail_writes` makes
/// every subsequent `set` report a storage failure.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Internal("store mutex poisoned".to_string()))
    }
}

impl StringStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("memory store writes disabled".to_string()));
        }
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persists the full business collection as one JSON array under
/// [`BUSINESSES_KEY`], overwriting prior content on every save.
pub struct BusinessStore {
    store: Box<dyn StringStore>,
}

impl BusinessStore {
    pub fn new(store: Box<dyn StringStore>) -> Self {
        Self { store }
    }

    /// Absent or unparseable content degrades to an empty collection; load
    /// never raises.
    pub fn load(&self) -> Vec<Business> {
        let raw = match self.store.get(BUSINESSES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                tracing::warn!(error = %error, "business store read failed; starting with an empty collection");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Business>>(&raw) {
            Ok(businesses) => businesses,
            Err(error) => {
                tracing::warn!(error = %error, "stored business collection is malformed; starting with an empty collection");
                Vec::new()
            }
        }
    }

    pub fn save(&self, businesses: &[Business]) -> AppResult<()> {
        let raw = serde_json::to_string(businesses)?;
        self.store.set(BUSINESSES_KEY, &raw)
    }
}
