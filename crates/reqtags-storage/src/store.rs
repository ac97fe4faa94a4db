//! [`SqliteStore`]: the SQLite-backed `IssueStore` and `AuditTrail`.

use std::path::Path;

use chrono::{DateTime, Utc};

use reqtags_core::errors::StorageError;
use reqtags_core::traits::{AuditTrail, IssueStore};
use reqtags_core::types::{
    AuditLogEntry, EnforcementRecord, Issue, IssueFilter, IssuePage, IssueState, Page,
};

use crate::connection::DatabaseManager;
use crate::queries::{audit_log, enforcements, issues};
use crate::retention::{self, RetentionReport};

/// Issue store and audit trail over one SQLite database.
pub struct SqliteStore {
    db: DatabaseManager,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open_in_memory()?,
        })
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }

    pub fn recent_audit_entries(&self, limit: u32) -> Result<Vec<AuditLogEntry>, StorageError> {
        self.db.with_reader(|conn| audit_log::query_recent(conn, limit))
    }

    pub fn audit_entries_with_prefix(&self, prefix: &str) -> Result<Vec<AuditLogEntry>, StorageError> {
        self.db
            .with_reader(|conn| audit_log::query_by_event_prefix(conn, prefix))
    }

    pub fn enforcements_for(&self, resource_id: &str) -> Result<Vec<EnforcementRecord>, StorageError> {
        self.db
            .with_reader(|conn| enforcements::query_by_resource(conn, resource_id))
    }

    pub fn issue_counts(&self) -> Result<Vec<(IssueState, u64)>, StorageError> {
        self.db.with_reader(issues::count_by_state)
    }

    /// Purge audit log entries past the retention window.
    pub fn purge_audit_log(
        &self,
        retention_days: u32,
        now: DateTime<Utc>,
    ) -> Result<RetentionReport, StorageError> {
        let report = self
            .db
            .with_writer(|conn| retention::purge_audit_log(conn, retention_days, now))?;
        if report.deleted > 0 {
            self.db.checkpoint()?;
        }
        Ok(report)
    }
}

impl IssueStore for SqliteStore {
    fn load_issues(&self) -> Result<Vec<Issue>, StorageError> {
        self.db.with_reader(issues::load_all_issues)
    }

    fn get_issue(&self, id: &str) -> Result<Option<Issue>, StorageError> {
        self.db.with_reader(|conn| issues::get_issue(conn, id))
    }

    fn save_issue(&self, issue: &Issue) -> Result<(), StorageError> {
        self.db.with_writer(|conn| issues::upsert_issue(conn, issue))
    }

    fn delete_issue(&self, id: &str) -> Result<bool, StorageError> {
        self.db.with_writer(|conn| issues::delete_issue(conn, id))
    }

    fn search_issues(&self, filter: &IssueFilter, page: Page) -> Result<IssuePage, StorageError> {
        self.db
            .with_reader(|conn| issues::search_issues(conn, filter, page))
    }
}

impl AuditTrail for SqliteStore {
    fn record_event(&self, entry: &AuditLogEntry) -> Result<(), StorageError> {
        self.db.with_writer(|conn| audit_log::insert_entry(conn, entry))
    }

    fn record_enforcement(&self, record: &EnforcementRecord) -> Result<(), StorageError> {
        self.db
            .with_writer(|conn| enforcements::insert_enforcement(conn, record))
    }

    fn purge_events(&self, retention_days: u32, now: DateTime<Utc>) -> Result<u64, StorageError> {
        self.purge_audit_log(retention_days, now).map(|report| report.deleted)
    }
}
