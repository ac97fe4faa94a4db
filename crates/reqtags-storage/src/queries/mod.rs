//! Query modules: free functions over `&Connection`.

pub mod audit_log;
pub mod enforcements;
pub mod issues;

use chrono::{DateTime, SecondsFormat, Utc};
use reqtags_core::errors::StorageError;

pub(crate) fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

/// Fixed-width RFC 3339 so that text order is time order.
pub(crate) fn encode_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn decode_time(table: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRow {
            table: table.to_string(),
            message: format!("bad timestamp {raw:?}: {e}"),
        })
}

pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    table: &str,
    raw: &str,
) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::CorruptRow {
        table: table.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn encode_json<T: serde::Serialize>(table: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::CorruptRow {
        table: table.to_string(),
        message: e.to_string(),
    })
}
