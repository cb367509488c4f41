use crate::core::error::FaqError;
use crate::core::schemas;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn db_connect(db_path: &Path, busy_timeout: Duration) -> Result<Connection, FaqError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(busy_timeout)
        .map_err(FaqError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(FaqError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(FaqError::RusqliteError)?;
    Ok(conn)
}

pub fn faq_db_path(root: &Path) -> PathBuf {
    root.join(schemas::FAQ_DB_NAME)
}

/// Creates the data directory if needed and returns the database path inside it.
pub fn prepare_data_root(root: &Path) -> Result<PathBuf, FaqError> {
    fs::create_dir_all(root).map_err(FaqError::IoError)?;
    Ok(faq_db_path(root))
}

/// Runs `operation` inside one transaction; any error rolls everything back.
///
/// Rollback happens through `Transaction`'s `Drop`, so an early `?` inside the
/// closure never leaves a half-applied write behind.
pub fn execute_in_transaction<F, T>(
    conn: &mut Connection,
    behavior: TransactionBehavior,
    operation: F,
) -> Result<T, FaqError>
where
    F: FnOnce(&Transaction) -> Result<T, FaqError>,
{
    let tx = conn.transaction_with_behavior(behavior)?;
    let result = operation(&tx)?;
    tx.commit()?;
    Ok(result)
}
