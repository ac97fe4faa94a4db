//! Interval scheduling for the host's worker loop.

use chrono::{DateTime, Duration, Utc};

use reqtags_core::errors::AuditError;
use reqtags_core::traits::{Cancellable, CancellationToken};

use crate::auditor::{RequiredTagsAuditor, RunReport};

/// Runs the auditor at most once per configured interval.
///
/// The host calls [`AuditRunner::tick`] from its own loop. A run that fails
/// still counts as the interval's run; the next attempt waits a full
/// interval.
pub struct AuditRunner {
    auditor: RequiredTagsAuditor,
    last_run: Option<DateTime<Utc>>,
    cancel: CancellationToken,
}

impl AuditRunner {
    pub fn new(auditor: RequiredTagsAuditor) -> Self {
        Self {
            auditor,
            last_run: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn auditor(&self) -> &RequiredTagsAuditor {
        &self.auditor
    }

    pub fn auditor_mut(&mut self) -> &mut RequiredTagsAuditor {
        &mut self.auditor
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    /// Token the host can use to stop an in-flight run.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Let scheduled runs start again after a stop request.
    pub fn resume(&self) {
        self.cancel.resume();
    }

    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.auditor.config().effective_interval()))
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.auditor.config().is_enabled() || self.cancel.is_cancelled() {
            return false;
        }
        match self.last_run {
            None => true,
            Some(last) => now - last >= self.interval(),
        }
    }

    /// Run the auditor when enabled and due; `Ok(None)` otherwise.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<RunReport>, AuditError> {
        if !self.is_due(now) {
            return Ok(None);
        }
        self.last_run = Some(now);
        tracing::debug!(%now, "starting scheduled required tags run");
        self.auditor.run(now, &self.cancel).map(Some)
    }
}
