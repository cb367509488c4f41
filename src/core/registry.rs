//! Namespace allocation.
//!
//! A namespace is one chat group's isolated FAQ scope. Its ledger is allocated
//! the first time something is written to it; the shared `global` namespace is
//! allocated by [`NamespaceRegistry::bootstrap`] before any traffic is served.

use crate::core::error::FaqError;
use crate::core::pool::SqlitePool;
use crate::core::time;
use crate::subsystems;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared scope visible to every deployment.
pub const GLOBAL_NAMESPACE: &str = "global";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub id: String,
    pub created_at: i64,
    /// Sequence number the next appended version will receive.
    pub next_seq: i64,
}

#[derive(Clone)]
pub struct NamespaceRegistry {
    pool: Arc<SqlitePool>,
}

impl NamespaceRegistry {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Creates all tables and the global namespace. Safe to call repeatedly.
    pub fn bootstrap(&self) -> Result<(), FaqError> {
        self.pool.with_write(|tx| {
            subsystems::initialize_all(tx)?;
            ensure_in(tx, GLOBAL_NAMESPACE)?;
            Ok(())
        })
    }

    /// Create-if-absent. Returns `true` when this call allocated the namespace.
    pub fn ensure(&self, namespace: &str) -> Result<bool, FaqError> {
        validate_namespace(namespace)?;
        self.pool.with_write(|tx| ensure_in(tx, namespace))
    }

    pub fn exists(&self, namespace: &str) -> Result<bool, FaqError> {
        self.pool.with_read(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM namespaces WHERE id = ?1",
                    params![namespace],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list(&self) -> Result<Vec<NamespaceInfo>, FaqError> {
        self.pool.with_read(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, created_at, next_seq FROM namespaces ORDER BY created_at, id")?;
            let rows = stmt.query_map([], |row| {
                Ok(NamespaceInfo {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                    next_seq: row.get(2)?,
                })
            })?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }
}

pub(crate) fn validate_namespace(namespace: &str) -> Result<(), FaqError> {
    if namespace.trim().is_empty() {
        return Err(FaqError::ValidationError(
            "namespace id must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Allocation guarded by the primary key: concurrent first writers all succeed,
/// exactly one of them inserts.
pub(crate) fn ensure_in(conn: &Connection, namespace: &str) -> Result<bool, FaqError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO namespaces(id, next_seq, created_at) VALUES(?1, 1, ?2)",
        params![namespace, time::now_epoch()],
    )?;
    if inserted == 1 {
        tracing::debug!(namespace, "allocated namespace ledger");
    }
    Ok(inserted == 1)
}
