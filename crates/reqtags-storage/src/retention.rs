//! Audit log retention.
//!
//! Issues are self-bounding (deleted when fixed) and enforcement history is
//! kept for the life of the database, so only `audit_log` is time-bounded.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use reqtags_core::errors::StorageError;

use crate::connection::writer::with_immediate_transaction;
use crate::queries::audit_log;

/// Report of what a purge removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionReport {
    pub cutoff: Option<DateTime<Utc>>,
    pub deleted: u64,
}

/// Delete audit log entries older than `retention_days` before `now`.
///
/// A window reaching past the earliest representable time purges nothing.
pub fn purge_audit_log(
    conn: &Connection,
    retention_days: u32,
    now: DateTime<Utc>,
) -> Result<RetentionReport, StorageError> {
    let Some(cutoff) =
        Duration::try_days(i64::from(retention_days)).and_then(|d| now.checked_sub_signed(d))
    else {
        tracing::debug!(retention_days, "retention window exceeds calendar range, nothing purged");
        return Ok(RetentionReport::default());
    };
    let deleted = with_immediate_transaction(conn, |tx| audit_log::delete_before(tx, &cutoff))?;
    if deleted > 0 {
        tracing::info!(rows_purged = deleted, cutoff = %cutoff, "purged audit log");
    }
    Ok(RetentionReport {
        cutoff: Some(cutoff),
        deleted,
    })
}
