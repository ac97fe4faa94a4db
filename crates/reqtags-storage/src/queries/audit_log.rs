//! Queries for the `audit_log` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use reqtags_core::errors::StorageError;
use reqtags_core::types::AuditLogEntry;

use super::{decode_json, decode_time, encode_json, encode_time, sqlite_err};

const TABLE: &str = "audit_log";

pub fn insert_entry(conn: &Connection, entry: &AuditLogEntry) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO audit_log (event, actor, data, created) VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.event,
            entry.actor,
            encode_json(TABLE, &entry.data)?,
            encode_time(&entry.created),
        ],
    )
    .map_err(sqlite_err)?;
    Ok(())
}

/// Most recent entries first.
pub fn query_recent(conn: &Connection, limit: u32) -> Result<Vec<AuditLogEntry>, StorageError> {
    collect(
        conn,
        "SELECT event, actor, data, created FROM audit_log ORDER BY created DESC, id DESC LIMIT ?1",
        params![limit],
    )
}

/// Entries whose event starts with `prefix`, oldest first.
pub fn query_by_event_prefix(
    conn: &Connection,
    prefix: &str,
) -> Result<Vec<AuditLogEntry>, StorageError> {
    collect(
        conn,
        "SELECT event, actor, data, created FROM audit_log
         WHERE substr(event, 1, length(?1)) = ?1 ORDER BY created, id",
        params![prefix],
    )
}

pub fn count(conn: &Connection) -> Result<u64, StorageError> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
        .map_err(sqlite_err)?;
    Ok(u64::try_from(n).unwrap_or(0))
}

/// Delete entries created before `cutoff`; returns rows deleted.
pub fn delete_before(conn: &Connection, cutoff: &DateTime<Utc>) -> Result<u64, StorageError> {
    let deleted = conn
        .execute(
            "DELETE FROM audit_log WHERE created < ?1",
            params![encode_time(cutoff)],
        )
        .map_err(sqlite_err)?;
    Ok(deleted as u64)
}

fn collect(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<AuditLogEntry>, StorageError> {
    let mut stmt = conn.prepare_cached(sql).map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(sqlite_err)?;

    let mut entries = Vec::new();
    for row in rows {
        let (event, actor, data, created) = row.map_err(sqlite_err)?;
        entries.push(AuditLogEntry {
            event,
            actor,
            data: decode_json(TABLE, &data)?,
            created: decode_time(TABLE, &created)?,
        });
    }
    Ok(entries)
}
