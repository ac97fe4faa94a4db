//! Stop requests for an in-flight audit run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::AuditError;

/// Polled by the auditor before each resource it evaluates and before each
/// issue it persists.
pub trait Cancellable: Send + Sync {
    fn is_cancelled(&self) -> bool;

    /// `Err(AuditError::Cancelled)` once a stop has been requested.
    fn ensure_running(&self) -> Result<(), AuditError> {
        if self.is_cancelled() {
            Err(AuditError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Stop flag shared between the host and the audit runner.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    requested: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the current and every later run to stop.
    pub fn cancel(&self) {
        if !self.requested.swap(true, Ordering::AcqRel) {
            tracing::debug!("audit run stop requested");
        }
    }

    /// Clear a stop request so scheduled runs start again.
    pub fn resume(&self) {
        self.requested.store(false, Ordering::Release);
    }
}

impl Cancellable for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
