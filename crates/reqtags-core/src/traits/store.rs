//! Persistence seams for issues and the audit trail.

use chrono::{DateTime, Utc};

use crate::errors::StorageError;
use crate::types::{AuditLogEntry, EnforcementRecord, Issue, IssueFilter, IssuePage, Page};

/// Issue persistence.
pub trait IssueStore: Send + Sync {
    fn load_issues(&self) -> Result<Vec<Issue>, StorageError>;

    fn get_issue(&self, id: &str) -> Result<Option<Issue>, StorageError>;

    /// Insert or replace an issue.
    fn save_issue(&self, issue: &Issue) -> Result<(), StorageError>;

    /// Delete an issue; returns whether it existed.
    fn delete_issue(&self, id: &str) -> Result<bool, StorageError>;

    fn search_issues(&self, filter: &IssueFilter, page: Page) -> Result<IssuePage, StorageError>;
}

/// Append-only audit log and enforcement history.
pub trait AuditTrail: Send + Sync {
    fn record_event(&self, entry: &AuditLogEntry) -> Result<(), StorageError>;

    fn record_enforcement(&self, record: &EnforcementRecord) -> Result<(), StorageError>;

    /// Drop audit log entries older than `retention_days` before `now`;
    /// returns the number removed.
    fn purge_events(&self, retention_days: u32, now: DateTime<Utc>) -> Result<u64, StorageError>;
}
