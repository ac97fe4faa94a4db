//! AuditEventHandler trait, all methods with no-op defaults.

use super::types::*;

/// Trait for handling auditor events.
///
/// All methods have no-op default implementations, so handlers only need
/// to override the events they care about.
pub trait AuditEventHandler: Send + Sync {
    // ---- Run Lifecycle ----
    fn on_run_started(&self, _event: &RunStartedEvent) {}
    fn on_run_complete(&self, _event: &RunCompleteEvent) {}

    // ---- Issue Lifecycle ----
    fn on_issue_detected(&self, _event: &IssueDetectedEvent) {}
    fn on_issue_updated(&self, _event: &IssueUpdatedEvent) {}
    fn on_issue_fixed(&self, _event: &IssueFixedEvent) {}
    fn on_issue_removed(&self, _event: &IssueRemovedEvent) {}

    // ---- Alerting ----
    fn on_alert_sent(&self, _event: &AlertSentEvent) {}
    fn on_notification_sent(&self, _event: &NotificationSentEvent) {}

    // ---- Enforcement ----
    fn on_awaiting_confirmation(&self, _event: &AwaitingConfirmationEvent) {}
    fn on_action_applied(&self, _event: &ActionAppliedEvent) {}
    fn on_action_failed(&self, _event: &ActionFailedEvent) {}

    // ---- Errors ----
    fn on_error(&self, _event: &ErrorEvent) {}
}
