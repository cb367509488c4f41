//! Versioned answer store.
//!
//! Each namespace owns an append-only chain of [`AnswerRecord`]s. For every
//! `(namespace, question)` pair at most one record carries `is_latest`; when
//! that record is also `is_deleted` it is a tombstone and the question has no
//! active answer. Writes flip the previous latest record and append the new
//! version inside a single `IMMEDIATE` transaction, and a partial unique index
//! rejects any state with two latest records.

use crate::core::error::FaqError;
use crate::core::pool::SqlitePool;
use crate::core::registry::{self, validate_namespace};
use crate::core::time;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Namespace-scoped, store-assigned, never reused.
    pub sequence: i64,
    pub question: String,
    pub answer: String,
    pub is_latest: bool,
    pub is_deleted: bool,
    pub tag: String,
    pub editor_id: String,
    pub edited_at: i64,
}

impl AnswerRecord {
    pub fn is_active(&self) -> bool {
        self.is_latest && !self.is_deleted
    }
}

/// Who made a change and when.
#[derive(Debug, Clone, Copy)]
pub struct Editor<'a> {
    pub id: &'a str,
    pub at: i64,
}

impl<'a> Editor<'a> {
    pub fn new(id: &'a str, at: i64) -> Self {
        Self { id, at }
    }

    pub fn now(id: &'a str) -> Self {
        Self {
            id,
            at: time::now_epoch(),
        }
    }
}

/// The content of a version about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub answer: String,
    pub tag: String,
    pub deleted: bool,
}

impl Revision {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            tag: String::new(),
            deleted: false,
        }
    }

    pub fn tagged(answer: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            tag: tag.into(),
            deleted: false,
        }
    }

    pub fn tombstone() -> Self {
        Self {
            answer: String::new(),
            tag: String::new(),
            deleted: true,
        }
    }
}

const RECORD_COLUMNS: &str =
    "seq, question, answer, latest, deleted, tag, editor_id, edited_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AnswerRecord> {
    Ok(AnswerRecord {
        sequence: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        is_latest: row.get(3)?,
        is_deleted: row.get(4)?,
        tag: row.get(5)?,
        editor_id: row.get(6)?,
        edited_at: row.get(7)?,
    })
}

#[derive(Clone)]
pub struct AnswerStore {
    pool: Arc<SqlitePool>,
}

impl AnswerStore {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Appends a new active version, superseding whatever was latest.
    pub fn put(
        &self,
        namespace: &str,
        question: &str,
        answer: &str,
        editor: Editor<'_>,
        tag: &str,
    ) -> Result<AnswerRecord, FaqError> {
        self.revise(namespace, question, editor, |_| {
            Ok(Revision::tagged(answer, tag))
        })
    }

    /// Appends a tombstone: the question stops resolving but keeps its history.
    pub fn soft_delete(
        &self,
        namespace: &str,
        question: &str,
        editor: Editor<'_>,
    ) -> Result<AnswerRecord, FaqError> {
        self.revise(namespace, question, editor, |_| Ok(Revision::tombstone()))
    }

    /// Conditional write: `decide` sees the current active record (if any) inside
    /// the write transaction and either returns the next revision or an error
    /// that aborts without writing.
    ///
    /// `decide` may be invoked again if the database is busy.
    pub fn revise<F>(
        &self,
        namespace: &str,
        question: &str,
        editor: Editor<'_>,
        mut decide: F,
    ) -> Result<AnswerRecord, FaqError>
    where
        F: FnMut(Option<&AnswerRecord>) -> Result<Revision, FaqError>,
    {
        validate_namespace(namespace)?;
        validate_question(question)?;
        self.pool.with_write(|tx| {
            let current = active_in(tx, namespace, question)?;
            let revision = decide(current.as_ref())?;
            append_in(tx, namespace, question, &revision, editor)
        })
    }

    /// Copies `src`'s active answer to `dst` in one transaction. Returns the copied
    /// record, or `NotFound` when `src` has no active answer.
    pub fn copy(
        &self,
        namespace: &str,
        src: &str,
        dst: &str,
        editor: Editor<'_>,
    ) -> Result<AnswerRecord, FaqError> {
        validate_namespace(namespace)?;
        validate_question(src)?;
        validate_question(dst)?;
        self.pool.with_write(|tx| {
            let source = active_in(tx, namespace, src)?
                .ok_or_else(|| FaqError::NotFound(src.to_string()))?;
            append_in(tx, namespace, dst, &Revision::answer(source.answer), editor)
        })
    }

    /// Returns the active answer, if the question currently has one.
    pub fn get(&self, namespace: &str, question: &str) -> Result<Option<String>, FaqError> {
        Ok(self.get_record(namespace, question)?.map(|r| r.answer))
    }

    pub fn get_record(
        &self,
        namespace: &str,
        question: &str,
    ) -> Result<Option<AnswerRecord>, FaqError> {
        self.pool.with_read(|conn| active_in(conn, namespace, question))
    }

    /// Hard-deletes the newest version of `question` and promotes the next newest
    /// remaining version to latest. Returns `false` when the question has no records.
    pub fn rollback(&self, namespace: &str, question: &str) -> Result<bool, FaqError> {
        self.pool.with_write(|tx| {
            let newest: Option<i64> = tx.query_row(
                "SELECT MAX(seq) FROM answers WHERE namespace = ?1 AND question = ?2",
                params![namespace, question],
                |row| row.get(0),
            )?;
            let Some(newest) = newest else {
                return Ok(false);
            };
            tx.execute(
                "DELETE FROM answers WHERE namespace = ?1 AND seq = ?2",
                params![namespace, newest],
            )?;
            tx.execute(
                "UPDATE answers SET latest = 1
                 WHERE namespace = ?1 AND seq = (
                     SELECT MAX(seq) FROM answers WHERE namespace = ?1 AND question = ?2
                 )",
                params![namespace, question],
            )?;
            tracing::debug!(namespace, question, seq = newest, "rolled back version");
            Ok(true)
        })
    }

    /// Versions of `question`, newest first, at most `limit` of them.
    pub fn history(
        &self,
        namespace: &str,
        question: &str,
        limit: usize,
    ) -> Result<Vec<AnswerRecord>, FaqError> {
        self.pool.with_read(|conn| {
            let sql = format!(
                "SELECT {RECORD_COLUMNS} FROM answers
                 WHERE namespace = ?1 AND question = ?2
                 ORDER BY seq DESC LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![namespace, question, limit as i64], record_from_row)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }

    /// `(question, tag)` for every active record, in sequence order.
    pub fn list_active(&self, namespace: &str) -> Result<Vec<(String, String)>, FaqError> {
        self.pool.with_read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT question, tag FROM answers
                 WHERE namespace = ?1 AND latest = 1 AND deleted = 0
                 ORDER BY seq",
            )?;
            let rows = stmt.query_map(params![namespace], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let mut out: Vec<(String, String)> = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }

    /// Number of records flagged latest for `question`; zero or one in any valid state.
    pub fn latest_count(&self, namespace: &str, question: &str) -> Result<usize, FaqError> {
        self.pool.with_read(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM answers WHERE namespace = ?1 AND question = ?2 AND latest = 1",
                params![namespace, question],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        })
    }
}

fn validate_question(question: &str) -> Result<(), FaqError> {
    if question.is_empty() || question.chars().any(char::is_whitespace) {
        return Err(FaqError::ValidationError(format!(
            "question key must be a single non-empty token, got {:?}",
            question
        )));
    }
    Ok(())
}

fn active_in(
    conn: &Connection,
    namespace: &str,
    question: &str,
) -> Result<Option<AnswerRecord>, FaqError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM answers
         WHERE namespace = ?1 AND question = ?2 AND latest = 1 AND deleted = 0"
    );
    Ok(conn
        .query_row(&sql, params![namespace, question], record_from_row)
        .optional()?)
}

/// Flip-then-append. Must run inside the caller's write transaction.
fn append_in(
    conn: &Connection,
    namespace: &str,
    question: &str,
    revision: &Revision,
    editor: Editor<'_>,
) -> Result<AnswerRecord, FaqError> {
    registry::ensure_in(conn, namespace)?;

    let seq: i64 = conn.query_row(
        "SELECT next_seq FROM namespaces WHERE id = ?1",
        params![namespace],
        |row| row.get(0),
    )?;
    conn.execute(
        "UPDATE namespaces SET next_seq = next_seq + 1 WHERE id = ?1",
        params![namespace],
    )?;
    conn.execute(
        "UPDATE answers SET latest = 0
         WHERE namespace = ?1 AND question = ?2 AND latest = 1",
        params![namespace, question],
    )?;
    conn.execute(
        "INSERT INTO answers(namespace, seq, question, answer, latest, deleted, tag, editor_id, edited_at)
         VALUES(?1, ?2, ?3, ?4, 1, ?5, ?6, ?7, ?8)",
        params![
            namespace,
            seq,
            question,
            revision.answer,
            revision.deleted,
            revision.tag,
            editor.id,
            editor.at
        ],
    )?;

    Ok(AnswerRecord {
        sequence: seq,
        question: question.to_string(),
        answer: revision.answer.clone(),
        is_latest: true,
        is_deleted: revision.deleted,
        tag: revision.tag.clone(),
        editor_id: editor.id.to_string(),
        edited_at: editor.at,
    })
}
