//! Issues: the persisted record of one non-compliant resource.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Resource, ResourceType};
use crate::constants::ISSUE_ID_PREFIX;

/// Lifecycle of an issue. Ordered: a later variant is further along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    /// First seen, no scheduled alert sent beyond detection.
    Detected,
    /// At least one scheduled alert has been sent.
    Alerted,
    /// Enforcement is due but waits for an operator confirmation.
    AwaitingConfirmation,
    /// The resource has been stopped.
    Stopped,
    /// The resource has been removed.
    Removed,
}

impl IssueState {
    pub const ALL: [IssueState; 5] = [
        Self::Detected,
        Self::Alerted,
        Self::AwaitingConfirmation,
        Self::Stopped,
        Self::Removed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::Alerted => "alerted",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Stopped => "stopped",
            Self::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == s)
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable issue id for a resource: `reqtag-` plus the last 16 hex
/// characters of the resource id's BLAKE3 hash.
pub fn issue_id_for(resource_id: &str) -> String {
    let hex = blake3::hash(resource_id.as_bytes()).to_hex();
    let tail = &hex.as_str()[hex.len() - 16..];
    format!("{ISSUE_ID_PREFIX}-{tail}")
}

/// A non-compliant resource tracked across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub account_id: String,
    pub location: String,
    pub state: IssueState,
    /// First detection; every schedule offset counts from here.
    pub created: DateTime<Utc>,
    pub last_change: DateTime<Utc>,
    pub next_change: Option<DateTime<Utc>>,
    /// Number of scheduled alert offsets already notified.
    pub alerts_sent: u32,
    /// Operator confirmed enforcement for this issue.
    pub confirmed: bool,
    pub missing_tags: Vec<String>,
    pub notes: Vec<String>,
}

impl Issue {
    /// Open a new issue for a resource detected at `now`.
    pub fn open(
        resource: &Resource,
        mut missing_tags: Vec<String>,
        mut notes: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        missing_tags.sort();
        notes.sort();
        Self {
            id: issue_id_for(&resource.id),
            resource_id: resource.id.clone(),
            resource_type: resource.resource_type.clone(),
            account_id: resource.account_id.clone(),
            location: resource.location.clone(),
            state: IssueState::Detected,
            created: now,
            last_change: now,
            next_change: None,
            alerts_sent: 0,
            confirmed: false,
            missing_tags,
            notes,
        }
    }

    /// Replace the findings; returns true when they changed.
    pub fn refresh_findings(&mut self, mut missing_tags: Vec<String>, mut notes: Vec<String>) -> bool {
        missing_tags.sort();
        notes.sort();
        if self.missing_tags == missing_tags && self.notes == notes {
            return false;
        }
        self.missing_tags = missing_tags;
        self.notes = notes;
        true
    }

    /// Move to `state`; returns true when the state changed.
    pub fn transition(&mut self, state: IssueState, now: DateTime<Utc>) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state;
        self.last_change = now;
        true
    }

    /// Time since first detection, never negative.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.created).max(chrono::Duration::zero())
    }

    pub fn is_enforced(&self) -> bool {
        self.state >= IssueState::Stopped
    }
}
