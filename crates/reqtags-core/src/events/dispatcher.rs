//! AuditEventDispatcher: synchronous event dispatch, zero overhead when empty.

use std::sync::Arc;

use super::handler::AuditEventHandler;
use super::types::*;

/// Synchronous event dispatcher wrapping a list of handlers.
#[derive(Default)]
pub struct AuditEventDispatcher {
    handlers: Vec<Arc<dyn AuditEventHandler>>,
}

impl AuditEventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register an event handler.
    pub fn register(&mut self, handler: Arc<dyn AuditEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Emit an event to all registered handlers.
    /// A panicking handler is logged and does not stop the others.
    fn emit<F: Fn(&dyn AuditEventHandler)>(&self, event_name: &'static str, f: F) {
        for handler in &self.handlers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(handler.as_ref());
            }));
            if result.is_err() {
                tracing::warn!(event = event_name, "event handler panicked, skipping");
            }
        }
    }

    // ---- Run Lifecycle ----
    pub fn emit_run_started(&self, event: &RunStartedEvent) {
        self.emit("run_started", |h| h.on_run_started(event));
    }

    pub fn emit_run_complete(&self, event: &RunCompleteEvent) {
        self.emit("run_complete", |h| h.on_run_complete(event));
    }

    // ---- Issue Lifecycle ----
    pub fn emit_issue_detected(&self, event: &IssueDetectedEvent) {
        self.emit("issue_detected", |h| h.on_issue_detected(event));
    }

    pub fn emit_issue_updated(&self, event: &IssueUpdatedEvent) {
        self.emit("issue_updated", |h| h.on_issue_updated(event));
    }

    pub fn emit_issue_fixed(&self, event: &IssueFixedEvent) {
        self.emit("issue_fixed", |h| h.on_issue_fixed(event));
    }

    pub fn emit_issue_removed(&self, event: &IssueRemovedEvent) {
        self.emit("issue_removed", |h| h.on_issue_removed(event));
    }

    // ---- Alerting ----
    pub fn emit_alert_sent(&self, event: &AlertSentEvent) {
        self.emit("alert_sent", |h| h.on_alert_sent(event));
    }

    pub fn emit_notification_sent(&self, event: &NotificationSentEvent) {
        self.emit("notification_sent", |h| h.on_notification_sent(event));
    }

    // ---- Enforcement ----
    pub fn emit_awaiting_confirmation(&self, event: &AwaitingConfirmationEvent) {
        self.emit("awaiting_confirmation", |h| h.on_awaiting_confirmation(event));
    }

    pub fn emit_action_applied(&self, event: &ActionAppliedEvent) {
        self.emit("action_applied", |h| h.on_action_applied(event));
    }

    pub fn emit_action_failed(&self, event: &ActionFailedEvent) {
        self.emit("action_failed", |h| h.on_action_failed(event));
    }

    // ---- Errors ----
    pub fn emit_error(&self, event: &ErrorEvent) {
        self.emit("error", |h| h.on_error(event));
    }
}
