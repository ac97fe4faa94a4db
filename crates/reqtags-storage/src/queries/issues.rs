//! Queries for the `issues` table.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use reqtags_core::errors::StorageError;
use reqtags_core::types::{Issue, IssueFilter, IssuePage, IssueState, Page, ResourceType};

use super::{decode_json, decode_time, encode_json, encode_time, sqlite_err};

const TABLE: &str = "issues";

const COLUMNS: &str = "id, resource_id, resource_type, account_id, location, state, created, \
     last_change, next_change, alerts_sent, confirmed, missing_tags, notes";

/// Raw column values, decoded into an [`Issue`] outside the row closure.
struct IssueRow {
    id: String,
    resource_id: String,
    resource_type: String,
    account_id: String,
    location: String,
    state: String,
    created: String,
    last_change: String,
    next_change: Option<String>,
    alerts_sent: u32,
    confirmed: bool,
    missing_tags: String,
    notes: String,
}

impl IssueRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            resource_id: row.get(1)?,
            resource_type: row.get(2)?,
            account_id: row.get(3)?,
            location: row.get(4)?,
            state: row.get(5)?,
            created: row.get(6)?,
            last_change: row.get(7)?,
            next_change: row.get(8)?,
            alerts_sent: row.get(9)?,
            confirmed: row.get::<_, i64>(10)? != 0,
            missing_tags: row.get(11)?,
            notes: row.get(12)?,
        })
    }

    fn into_issue(self) -> Result<Issue, StorageError> {
        let state = IssueState::parse(&self.state).ok_or_else(|| StorageError::CorruptRow {
            table: TABLE.to_string(),
            message: format!("unknown state {:?} for {}", self.state, self.id),
        })?;
        Ok(Issue {
            state,
            resource_type: ResourceType::new(self.resource_type),
            created: decode_time(TABLE, &self.created)?,
            last_change: decode_time(TABLE, &self.last_change)?,
            next_change: self
                .next_change
                .as_deref()
                .map(|t| decode_time(TABLE, t))
                .transpose()?,
            missing_tags: decode_json(TABLE, &self.missing_tags)?,
            notes: decode_json(TABLE, &self.notes)?,
            id: self.id,
            resource_id: self.resource_id,
            account_id: self.account_id,
            location: self.location,
            alerts_sent: self.alerts_sent,
            confirmed: self.confirmed,
        })
    }
}

/// Insert or replace an issue.
pub fn upsert_issue(conn: &Connection, issue: &Issue) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO issues (id, resource_id, resource_type, account_id, location, state, created,
                             last_change, next_change, alerts_sent, confirmed, missing_tags, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(id) DO UPDATE SET
             resource_type = excluded.resource_type,
             account_id = excluded.account_id,
             location = excluded.location,
             state = excluded.state,
             last_change = excluded.last_change,
             next_change = excluded.next_change,
             alerts_sent = excluded.alerts_sent,
             confirmed = excluded.confirmed,
             missing_tags = excluded.missing_tags,
             notes = excluded.notes",
        params![
            issue.id,
            issue.resource_id,
            issue.resource_type.as_str(),
            issue.account_id,
            issue.location,
            issue.state.as_str(),
            encode_time(&issue.created),
            encode_time(&issue.last_change),
            issue.next_change.as_ref().map(encode_time),
            issue.alerts_sent,
            issue.confirmed as i64,
            encode_json(TABLE, &issue.missing_tags)?,
            encode_json(TABLE, &issue.notes)?,
        ],
    )
    .map_err(sqlite_err)?;
    Ok(())
}

pub fn get_issue(conn: &Connection, id: &str) -> Result<Option<Issue>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM issues WHERE id = ?1");
    let row = conn
        .prepare_cached(&sql)
        .map_err(sqlite_err)?
        .query_row(params![id], IssueRow::from_row)
        .optional()
        .map_err(sqlite_err)?;
    row.map(IssueRow::into_issue).transpose()
}

pub fn load_all_issues(conn: &Connection) -> Result<Vec<Issue>, StorageError> {
    let sql = format!("SELECT {COLUMNS} FROM issues ORDER BY created, id");
    let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], IssueRow::from_row)
        .map_err(sqlite_err)?;
    let mut issues = Vec::new();
    for row in rows {
        issues.push(row.map_err(sqlite_err)?.into_issue()?);
    }
    Ok(issues)
}

/// Delete an issue; returns whether a row was removed.
pub fn delete_issue(conn: &Connection, id: &str) -> Result<bool, StorageError> {
    let deleted = conn
        .execute("DELETE FROM issues WHERE id = ?1", params![id])
        .map_err(sqlite_err)?;
    Ok(deleted > 0)
}

/// Filtered, paginated search ordered by account, location, then id.
pub fn search_issues(
    conn: &Connection,
    filter: &IssueFilter,
    page: Page,
) -> Result<IssuePage, StorageError> {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    push_in_clause(&mut clauses, &mut values, "account_id", &filter.account_ids);
    push_in_clause(&mut clauses, &mut values, "location", &filter.locations);
    let states: Vec<String> = filter.states.iter().map(|s| s.as_str().to_string()).collect();
    push_in_clause(&mut clauses, &mut values, "state", &states);
    let types: Vec<String> = filter
        .resource_types
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();
    push_in_clause(&mut clauses, &mut values, "resource_type", &types);

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM issues{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )
        .map_err(sqlite_err)?;

    let limit = i64::from(page.count);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    let sql = format!(
        "SELECT {COLUMNS} FROM issues{where_sql} ORDER BY account_id, location, id LIMIT {limit} OFFSET {offset}"
    );
    let mut stmt = conn.prepare(&sql).map_err(sqlite_err)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), IssueRow::from_row)
        .map_err(sqlite_err)?;

    let mut issues = Vec::new();
    for row in rows {
        issues.push(row.map_err(sqlite_err)?.into_issue()?);
    }

    Ok(IssuePage {
        total: u64::try_from(total).unwrap_or(0),
        issues,
    })
}

/// Issue counts per state.
pub fn count_by_state(conn: &Connection) -> Result<Vec<(IssueState, u64)>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT state, COUNT(*) FROM issues GROUP BY state")
        .map_err(sqlite_err)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(sqlite_err)?;

    let mut counts = Vec::new();
    for row in rows {
        let (state, count) = row.map_err(sqlite_err)?;
        if let Some(state) = IssueState::parse(&state) {
            counts.push((state, u64::try_from(count).unwrap_or(0)));
        }
    }
    counts.sort_by_key(|(state, _)| *state);
    Ok(counts)
}

fn push_in_clause(
    clauses: &mut Vec<String>,
    values: &mut Vec<Value>,
    column: &str,
    wanted: &[String],
) {
    if wanted.is_empty() {
        return;
    }
    let placeholders = vec!["?"; wanted.len()].join(", ");
    clauses.push(format!("{column} IN ({placeholders})"));
    values.extend(wanted.iter().cloned().map(Value::Text));
}
