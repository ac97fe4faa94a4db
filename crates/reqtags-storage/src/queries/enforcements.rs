//! Queries for the `enforcements` table.

use rusqlite::{params, Connection};

use reqtags_core::errors::StorageError;
use reqtags_core::types::{ActionKind, ActionStatus, EnforcementRecord, ResourceType};

use super::{decode_json, decode_time, encode_json, encode_time, sqlite_err};

const TABLE: &str = "enforcements";

pub fn insert_enforcement(conn: &Connection, record: &EnforcementRecord) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO enforcements (account_id, resource_id, resource_type, action, status, metrics, created)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.account_id,
            record.resource_id,
            record.resource_type.as_str(),
            record.action.as_str(),
            record.status.as_str(),
            encode_json(TABLE, &record.metrics)?,
            encode_time(&record.created),
        ],
    )
    .map_err(sqlite_err)?;
    Ok(())
}

/// Enforcement history for one resource, oldest first.
pub fn query_by_resource(
    conn: &Connection,
    resource_id: &str,
) -> Result<Vec<EnforcementRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT account_id, resource_id, resource_type, action, status, metrics, created
             FROM enforcements WHERE resource_id = ?1 ORDER BY created, id",
        )
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params![resource_id], |row| {
            Ok([
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ])
        })
        .map_err(sqlite_err)?;

    let mut records = Vec::new();
    for row in rows {
        let [account_id, resource_id, resource_type, action, status, metrics, created] =
            row.map_err(sqlite_err)?;
        let action = ActionKind::parse(&action).ok_or_else(|| corrupt(format!("action {action:?}")))?;
        let status =
            ActionStatus::parse(&status).ok_or_else(|| corrupt(format!("status {status:?}")))?;
        records.push(EnforcementRecord {
            account_id,
            resource_id,
            resource_type: ResourceType::new(resource_type),
            action,
            status,
            metrics: decode_json(TABLE, &metrics)?,
            created: decode_time(TABLE, &created)?,
        });
    }
    Ok(records)
}

fn corrupt(message: String) -> StorageError {
    StorageError::CorruptRow {
        table: TABLE.to_string(),
        message,
    }
}
