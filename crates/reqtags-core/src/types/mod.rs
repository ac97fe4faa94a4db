//! Domain types shared across the auditor crates.

pub mod action;
pub mod audit;
pub mod issue;
pub mod query;
pub mod resource;

pub use action::{ActionKind, ActionStatus};
pub use audit::{AuditLogEntry, EnforcementRecord};
pub use issue::{issue_id_for, Issue, IssueState};
pub use query::{IssueFilter, IssuePage, Page};
pub use resource::{Account, Contact, Resource, ResourceType, Tag};
