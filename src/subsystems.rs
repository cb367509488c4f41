//! Schema registration: every table the crate creates, in init order.
//!
//! Adding a new table: append its statements to the owning entry in `SUBSYSTEMS`.

use crate::core::{error, schemas};
use rusqlite::Connection;

pub(crate) struct SubsystemInit {
    /// Subsystem identifier (used in bootstrap diagnostics).
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

/// Order matters: `answers` references `namespaces`.
pub(crate) const SUBSYSTEMS: &[SubsystemInit] = &[
    SubsystemInit {
        name: "ledger",
        statements: &[
            schemas::NAMESPACES_SCHEMA,
            schemas::ANSWERS_SCHEMA,
            schemas::ANSWERS_LATEST_INDEX,
            schemas::ANSWERS_QUESTION_INDEX,
            schemas::ANSWERS_TAG_INDEX,
        ],
    },
    SubsystemInit {
        name: "group_config",
        statements: &[schemas::GROUP_CONFIG_SCHEMA],
    },
];

/// Create every subsystem's tables on `conn` (normally inside the bootstrap transaction).
pub(crate) fn initialize_all(conn: &Connection) -> Result<(), error::FaqError> {
    for sub in SUBSYSTEMS {
        for stmt in sub.statements {
            conn.execute(stmt, [])?;
        }
        tracing::debug!(subsystem = sub.name, "schema ready");
    }
    Ok(())
}
