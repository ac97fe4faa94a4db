//! Storage errors.

use super::error_code::{self, ReqTagsErrorCode};

/// Errors raised by the issue store and audit trail.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },

    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: String, message: String },
}

impl ReqTagsErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::IssueNotFound { .. } => error_code::ISSUE_NOT_FOUND,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
