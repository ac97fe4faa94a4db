//! Audit trail records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActionKind, ActionStatus, ResourceType};

/// A single audit log line: who did what, with structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub event: String,
    pub actor: String,
    pub data: serde_json::Value,
    pub created: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        event: impl Into<String>,
        actor: impl Into<String>,
        data: serde_json::Value,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            event: event.into(),
            actor: actor.into(),
            data,
            created,
        }
    }
}

/// Record of an enforcement action that changed a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnforcementRecord {
    pub account_id: String,
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub action: ActionKind,
    pub status: ActionStatus,
    /// Resource metrics captured before the action.
    pub metrics: serde_json::Value,
    pub created: DateTime<Utc>,
}
