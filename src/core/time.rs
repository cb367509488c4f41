//! Timestamp helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix-epoch seconds.
pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Renders epoch seconds with a `Z` suffix (e.g. `1771220592Z`).
pub fn epoch_z(secs: i64) -> String {
    format!("{}Z", secs)
}
