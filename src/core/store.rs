//! Store handle: one data directory, one database, the services built on it.

use crate::core::adapters::SqliteGroupConfig;
use crate::core::db;
use crate::core::error::FaqError;
use crate::core::ledger::AnswerStore;
use crate::core::pool::{DEFAULT_BUSY_TIMEOUT, SqlitePool};
use crate::core::registry::NamespaceRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Store {
    /// Absolute or working-directory-relative data directory.
    pub root: PathBuf,
    pool: Arc<SqlitePool>,
}

impl Store {
    /// Opens (creating if needed) the store under `root` and bootstraps the schema
    /// plus the global namespace.
    pub fn open(root: &Path, busy_timeout: Duration) -> Result<Self, FaqError> {
        let db_path = db::prepare_data_root(root)?;
        let store = Self {
            root: root.to_path_buf(),
            pool: Arc::new(SqlitePool::new(db_path, busy_timeout)),
        };
        store.registry().bootstrap()?;
        Ok(store)
    }

    pub fn open_default(root: &Path) -> Result<Self, FaqError> {
        Self::open(root, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn registry(&self) -> NamespaceRegistry {
        NamespaceRegistry::new(self.pool.clone())
    }

    pub fn answers(&self) -> AnswerStore {
        AnswerStore::new(self.pool.clone())
    }

    pub fn group_config(&self) -> SqliteGroupConfig {
        SqliteGroupConfig::new(self.pool.clone())
    }
}
