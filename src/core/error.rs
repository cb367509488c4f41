use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaqError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl FaqError {
    /// Persistence failures: never shown verbatim to chat users.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            FaqError::RusqliteError(_) | FaqError::IoError(_) | FaqError::StorageError(_)
        )
    }
}
