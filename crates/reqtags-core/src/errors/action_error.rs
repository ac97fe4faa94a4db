//! Enforcement action errors.

use super::error_code::{self, ReqTagsErrorCode};

/// Errors raised while stopping or removing a resource.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Failed to stop {resource_id}: {message}")]
    StopFailed { resource_id: String, message: String },

    #[error("Failed to remove {resource_id}: {message}")]
    RemoveFailed { resource_id: String, message: String },

    #[error("Action {action} is not supported for {resource_type}")]
    Unsupported {
        resource_type: String,
        action: String,
    },

    #[error("Cloud provider error: {0}")]
    Provider(String),
}

impl ReqTagsErrorCode for ActionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unsupported { .. } => error_code::ACTION_UNSUPPORTED,
            _ => error_code::ACTION_FAILED,
        }
    }
}
