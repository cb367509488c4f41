//! SQLite access with read/write separation and bounded retry.
//!
//! - Writes are serialized in-process through one mutex per database file and run
//!   inside an `IMMEDIATE` transaction, so another process holding the write lock
//!   surfaces as `SQLITE_BUSY` instead of a lost update.
//! - Reads open a fresh connection without the mutex (WAL allows concurrent readers).
//! - Every connection carries a `busy_timeout`, and busy/locked failures are retried
//!   a bounded number of times before being reported as `StorageError`.
//!
//! Connections are not cached; each operation opens its own.

use crate::core::db;
use crate::core::error::FaqError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Maximum retry attempts for busy/locked errors.
const MAX_RETRIES: u32 = 5;
/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 50;
/// Maximum delay cap (milliseconds).
const MAX_DELAY_MS: u64 = 2_000;

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection source for a single database file.
pub struct SqlitePool {
    db_path: PathBuf,
    busy_timeout: Duration,
    write_lock: Mutex<()>,
}

impl SqlitePool {
    pub fn new(db_path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout,
            write_lock: Mutex::new(()),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Execute `f` inside an `IMMEDIATE` transaction on a write connection.
    ///
    /// The closure may run more than once when SQLite reports the database busy;
    /// each attempt starts from a fresh transaction.
    pub fn with_write<F, R>(&self, mut f: F) -> Result<R, FaqError>
    where
        F: FnMut(&Transaction) -> Result<R, FaqError>,
    {
        // Guards no data, so a poisoned lock is still usable.
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        retry_on_busy(|| {
            let mut conn = db::db_connect(&self.db_path, self.busy_timeout)?;
            db::execute_in_transaction(&mut conn, TransactionBehavior::Immediate, &mut f)
        })
        .map_err(into_storage)
    }

    /// Execute `f` with a read connection (no mutex serialization).
    pub fn with_read<F, R>(&self, mut f: F) -> Result<R, FaqError>
    where
        F: FnMut(&Connection) -> Result<R, FaqError>,
    {
        retry_on_busy(|| {
            let conn = db::db_connect(&self.db_path, self.busy_timeout)?;
            f(&conn)
        })
        .map_err(into_storage)
    }
}

/// Retry a closure on `SQLITE_BUSY` / `DatabaseLocked` with exponential backoff.
fn retry_on_busy<F, R>(mut f: F) -> Result<R, FaqError>
where
    F: FnMut() -> Result<R, FaqError>,
{
    let mut attempt = 0u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if is_busy_error(&e) && attempt < MAX_RETRIES => {
                attempt += 1;
                let delay_ms = (BASE_DELAY_MS * 2u64.pow(attempt - 1)).min(MAX_DELAY_MS);
                tracing::debug!(attempt, delay_ms, "sqlite busy, retrying");
                thread::sleep(Duration::from_millis(delay_ms));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Check if an error is a SQLite busy/locked error that is retryable.
fn is_busy_error(err: &FaqError) -> bool {
    match err {
        FaqError::RusqliteError(rusqlite::Error::SqliteFailure(code, _)) => matches!(
            code.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}

/// Domain errors raised inside a closure pass through; driver failures become `StorageError`.
fn into_storage(err: FaqError) -> FaqError {
    match err {
        FaqError::RusqliteError(e) => FaqError::StorageError(e.to_string()),
        FaqError::IoError(e) => FaqError::StorageError(e.to_string()),
        other => other,
    }
}
