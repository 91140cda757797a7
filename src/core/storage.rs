//! Local key/value persistence
//!
//! Holds the two records the client keeps between runs (conversion history and
//! theme). Backed by an embedded redb database, with an in-memory fallback when
//! the database cannot be opened.

use redb::{Database, TableDefinition};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::project_dirs;

/// Key: record name, Value: serialized record
const LOCAL_STATE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("local_state");

/// Storage trait for the client's persisted records
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

/// Redb-based storage implementation
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Persistence(format!("Failed to create data directory: {}", e)))?;
        }

        let db = Database::create(path)?;

        // Initialize table so readers never see a missing table
        let write_txn = db.begin_write()?;
        {
            let _table = write_txn.open_table(LOCAL_STATE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open the database in the platform data directory
    pub fn open_default() -> AppResult<Self> {
        let dirs = project_dirs()?;
        Self::open(&dirs.data_dir().join("polycode.redb"))
    }
}

impl LocalStore for RedbStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOCAL_STATE_TABLE)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(LOCAL_STATE_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// In-memory storage (fallback when the database is unavailable, and for tests)
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.records
            .lock()
            .map_err(|e| AppError::Persistence(format!("Mutex poisoned: {}", e)))
    }
}

impl LocalStore for InMemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Open the default database, falling back to memory if that fails
pub fn open_local_store() -> Arc<dyn LocalStore> {
    match RedbStore::open_default() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("[LocalStore] Failed to initialize database: {}, using in-memory fallback", e);
            Arc::new(InMemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redb_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("state.redb")).unwrap();

        assert_eq!(store.get("theme").unwrap(), None);
        store.set("theme", "light").unwrap();
        assert_eq!(store.get("theme").unwrap(), Some("light".to_string()));

        store.set("theme", "dark").unwrap();
        assert_eq!(store.get("theme").unwrap(), Some("dark".to_string()));
    }

    #[test]
    fn test_redb_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("state.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store.set("polycode_history", "[]").unwrap();
        }

        let reopened = RedbStore::open(&path).unwrap();
        assert_eq!(reopened.get("polycode_history").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.set("k", "w").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("w".to_string()));
        assert_eq!(store.get("missing").unwrap(), None);
    }
}
