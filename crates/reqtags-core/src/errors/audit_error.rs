//! Auditor run errors and non-fatal error collection.

use super::error_code::{self, ReqTagsErrorCode};
use super::{ActionError, ConfigError, InventoryError, NotifyError, StorageError};

/// Errors that can occur during an auditor run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Audit run cancelled")]
    Cancelled,
}

impl ReqTagsErrorCode for AuditError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Inventory(e) => e.error_code(),
            Self::Action(e) => e.error_code(),
            Self::Notify(e) => e.error_code(),
            Self::Export(_) => error_code::EXPORT_FAILED,
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}

/// Non-fatal errors collected during a run.
/// A failed stop on one resource must not prevent the rest of the run.
#[derive(Debug, Default)]
pub struct RunErrors {
    errors: Vec<AuditError>,
}

impl RunErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-fatal error.
    pub fn push(&mut self, error: impl Into<AuditError>) {
        self.errors.push(error.into());
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuditError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<AuditError> {
        self.errors
    }
}
