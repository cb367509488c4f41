//! Database schema definitions.
//!
//! Everything lives in one SQLite file:
//! 1. `namespaces`: one row per allocated ledger, carrying its sequence counter.
//! 2. `answers`: the append-only version chain of every namespace.
//! 3. `group_config`: per-namespace settings such as plugin-group enable flags.

pub const FAQ_DB_NAME: &str = "faq.db";

pub const NAMESPACES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS namespaces (
        id TEXT PRIMARY KEY,
        next_seq INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL
    )
";

pub const ANSWERS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS answers (
        namespace TEXT NOT NULL,
        seq INTEGER NOT NULL,
        question TEXT NOT NULL,
        answer TEXT NOT NULL,
        latest INTEGER NOT NULL DEFAULT 1,
        deleted INTEGER NOT NULL DEFAULT 0,
        tag TEXT NOT NULL DEFAULT '',
        editor_id TEXT NOT NULL,
        edited_at INTEGER NOT NULL,
        PRIMARY KEY (namespace, seq),
        FOREIGN KEY(namespace) REFERENCES namespaces(id)
    )
";

/// At most one latest version per question, enforced by SQLite itself.
pub const ANSWERS_LATEST_INDEX: &str = "
    CREATE UNIQUE INDEX IF NOT EXISTS idx_answers_single_latest
    ON answers(namespace, question) WHERE latest = 1
";

pub const ANSWERS_QUESTION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(namespace, question, seq)";

pub const ANSWERS_TAG_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_answers_tag ON answers(namespace, tag, latest, deleted)";

pub const GROUP_CONFIG_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS group_config (
        namespace TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (namespace, key)
    )
";
