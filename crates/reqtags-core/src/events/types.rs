//! Event payload types for auditor lifecycle events.

use crate::types::{ActionKind, ActionStatus, IssueState};

/// Payload for `on_run_started`.
#[derive(Debug, Clone)]
pub struct RunStartedEvent {
    pub resource_types: Vec<String>,
    pub collect_only: bool,
}

/// Payload for `on_run_complete`.
#[derive(Debug, Clone)]
pub struct RunCompleteEvent {
    pub resources_checked: usize,
    pub new_issues: usize,
    pub fixed_issues: usize,
    pub actions_taken: usize,
    pub error_count: usize,
    pub duration_ms: u64,
}

/// Payload for `on_issue_detected`.
#[derive(Debug, Clone)]
pub struct IssueDetectedEvent {
    pub issue_id: String,
    pub resource_id: String,
    pub resource_type: String,
    pub missing_tags: Vec<String>,
}

/// Payload for `on_issue_updated`.
#[derive(Debug, Clone)]
pub struct IssueUpdatedEvent {
    pub issue_id: String,
    pub from: IssueState,
    pub to: IssueState,
}

/// Payload for `on_issue_fixed`.
#[derive(Debug, Clone)]
pub struct IssueFixedEvent {
    pub issue_id: String,
    pub resource_id: String,
}

/// Payload for `on_issue_removed`. The resource was removed by enforcement.
#[derive(Debug, Clone)]
pub struct IssueRemovedEvent {
    pub issue_id: String,
    pub resource_id: String,
}

/// Payload for `on_alert_sent`.
#[derive(Debug, Clone)]
pub struct AlertSentEvent {
    pub issue_id: String,
    pub alert_number: u32,
}

/// Payload for `on_awaiting_confirmation`.
#[derive(Debug, Clone)]
pub struct AwaitingConfirmationEvent {
    pub issue_id: String,
    pub action: ActionKind,
}

/// Payload for `on_action_applied`.
#[derive(Debug, Clone)]
pub struct ActionAppliedEvent {
    pub issue_id: String,
    pub resource_id: String,
    pub action: ActionKind,
    pub status: ActionStatus,
}

/// Payload for `on_action_failed`.
#[derive(Debug, Clone)]
pub struct ActionFailedEvent {
    pub issue_id: String,
    pub resource_id: String,
    pub action: ActionKind,
    pub message: String,
}

/// Payload for `on_notification_sent`.
#[derive(Debug, Clone)]
pub struct NotificationSentEvent {
    pub recipient: String,
    pub issues: usize,
    pub fixed: usize,
}

/// Payload for `on_error`.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
    pub error_code: String,
}
