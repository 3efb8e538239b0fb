//! Repository layer mapping documents and versions to SQLite rows
//!
//! Every function takes a `&Connection`; pass a `Transaction` (it derefs) to
//! compose several calls atomically.

pub mod documents;
pub mod versions;

use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
