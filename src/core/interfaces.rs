//! Contracts for the collaborators the FAQ core relies on but does not own:
//! the chat transport, the admin roster, the card renderer, the romanizer used
//! for list grouping and the per-namespace settings store.

use crate::core::error::FaqError;
use crate::core::ledger::AnswerRecord;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

/// A message leaving the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// Reference to a rendered card on disk.
    Image(PathBuf),
}

impl Outbound {
    pub fn text(s: impl Into<String>) -> Self {
        Outbound::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Outbound::Text(s) => Some(s),
            Outbound::Image(_) => None,
        }
    }
}

pub trait MessageChannel: Send + Sync {
    fn send(&self, namespace: &str, message: Outbound) -> Result<(), FaqError>;
}

pub trait AdminRoster: Send + Sync {
    fn admins(&self, namespace: &str) -> Result<HashSet<String>, FaqError>;

    /// Lookup failures count as "not an admin".
    fn is_admin(&self, namespace: &str, user_id: &str) -> bool {
        match self.admins(namespace) {
            Ok(admins) => admins.contains(user_id),
            Err(e) => {
                tracing::warn!(namespace, error = %e, "admin roster lookup failed");
                false
            }
        }
    }
}

/// Groups arrive pre-ordered; renderers must keep the order they are given.
pub trait ImageRenderer: Send + Sync {
    fn render_list(&self, title: &str, groups: &[(String, Vec<String>)])
    -> Result<PathBuf, FaqError>;

    fn render_history(&self, title: &str, records: &[AnswerRecord]) -> Result<PathBuf, FaqError>;
}

/// Sortable romanized key (pinyin for Chinese text).
pub trait PinyinKey: Send + Sync {
    fn key(&self, s: &str) -> String;
}

/// Per-namespace persisted settings, independent of the answer ledger.
pub trait GlobalConfig: Send + Sync {
    fn read(&self, namespace: &str, key: &str) -> Result<Option<Value>, FaqError>;
    fn write(&self, namespace: &str, key: &str, value: &Value) -> Result<(), FaqError>;
}
