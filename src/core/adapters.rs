//! Default collaborator implementations: SQLite-backed group settings, a roster
//! read from settings, stdout and in-memory channels, a plain-text card renderer
//! and an ASCII-folding sort key.

use crate::core::error::FaqError;
use crate::core::interfaces::{
    AdminRoster, GlobalConfig, ImageRenderer, MessageChannel, Outbound, PinyinKey,
};
use crate::core::ledger::AnswerRecord;
use crate::core::pool::SqlitePool;
use crate::core::time;
use rusqlite::{OptionalExtension, params};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use ulid::Ulid;

pub struct SqliteGroupConfig {
    pool: Arc<SqlitePool>,
}

impl SqliteGroupConfig {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

impl GlobalConfig for SqliteGroupConfig {
    fn read(&self, namespace: &str, key: &str) -> Result<Option<Value>, FaqError> {
        let raw: Option<String> = self.pool.with_read(|conn| {
            Ok(conn
                .query_row(
                    "SELECT value FROM group_config WHERE namespace = ?1 AND key = ?2",
                    params![namespace, key],
                    |row| row.get(0),
                )
                .optional()?)
        })?;
        raw.map(|s| {
            serde_json::from_str(&s).map_err(|e| {
                FaqError::StorageError(format!("corrupt config {namespace}/{key}: {e}"))
            })
        })
        .transpose()
    }

    fn write(&self, namespace: &str, key: &str, value: &Value) -> Result<(), FaqError> {
        let encoded = value.to_string();
        self.pool.with_write(|tx| {
            tx.execute(
                "INSERT INTO group_config(namespace, key, value, updated_at) VALUES(?1, ?2, ?3, ?4)
                 ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![namespace, key, encoded, time::now_epoch()],
            )?;
            Ok(())
        })
    }
}

/// Admin sets fixed at startup.
#[derive(Debug, Default, Clone)]
pub struct StaticAdminRoster {
    admins: FxHashMap<String, HashSet<String>>,
}

impl StaticAdminRoster {
    pub fn new(admins: FxHashMap<String, HashSet<String>>) -> Self {
        Self { admins }
    }

    pub fn with_admin(mut self, namespace: &str, user_id: &str) -> Self {
        self.admins
            .entry(namespace.to_string())
            .or_default()
            .insert(user_id.to_string());
        self
    }
}

impl AdminRoster for StaticAdminRoster {
    fn admins(&self, namespace: &str) -> Result<HashSet<String>, FaqError> {
        Ok(self.admins.get(namespace).cloned().unwrap_or_default())
    }
}

pub struct StdoutChannel;

impl MessageChannel for StdoutChannel {
    fn send(&self, namespace: &str, message: Outbound) -> Result<(), FaqError> {
        use colored::Colorize;
        match message {
            Outbound::Text(text) => println!("{} {}", format!("[{namespace}]").cyan(), text),
            Outbound::Image(path) => println!(
                "{} {}",
                format!("[{namespace}]").cyan(),
                format!("<card {}>", path.display()).magenta()
            ),
        }
        Ok(())
    }
}

/// Keeps every outgoing message in memory.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(String, Outbound)>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<(String, Outbound)> {
        let mut sent = self.sent.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *sent)
    }

    /// Text of the most recent message, if it was text.
    pub fn last_text(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap_or_else(|p| p.into_inner());
        sent.last().and_then(|(_, m)| m.as_text().map(str::to_string))
    }
}

impl MessageChannel for RecordingChannel {
    fn send(&self, namespace: &str, message: Outbound) -> Result<(), FaqError> {
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((namespace.to_string(), message));
        Ok(())
    }
}

/// Writes cards as plain text files; each render gets its own file.
pub struct TextCardRenderer {
    dir: PathBuf,
}

impl TextCardRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_card(&self, prefix: &str, body: &str) -> Result<PathBuf, FaqError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{prefix}-{}.txt", Ulid::new()));
        fs::write(&path, body)?;
        Ok(path)
    }
}

impl ImageRenderer for TextCardRenderer {
    fn render_list(
        &self,
        title: &str,
        groups: &[(String, Vec<String>)],
    ) -> Result<PathBuf, FaqError> {
        let mut body = format!("{title}\n");
        for (heading, items) in groups {
            body.push_str(&format!("\n[{heading}]\n{}\n", items.join("、")));
        }
        self.write_card("faq", &body)
    }

    fn render_history(&self, title: &str, records: &[AnswerRecord]) -> Result<PathBuf, FaqError> {
        let mut body = format!("{title}\n");
        for r in records {
            let mut heading = format!("faq_seq = {}", r.sequence);
            if r.is_deleted {
                heading.push_str("  [DELETED]");
            }
            if r.is_latest {
                heading.push_str("  [LATEST]");
            }
            body.push_str(&format!(
                "\n{heading}\n{} by {}\n#{}\n{}\n",
                time::epoch_z(r.edited_at),
                r.editor_id,
                r.tag,
                r.answer
            ));
        }
        self.write_card("faq-history", &body)
    }
}

/// Lowercases text and leaves non-ASCII characters untouched, so CJK keys fall
/// into the catch-all bucket unless a real romanizer is plugged in.
pub struct AsciiFoldKey;

impl PinyinKey for AsciiFoldKey {
    fn key(&self, s: &str) -> String {
        s.to_lowercase()
    }
}
