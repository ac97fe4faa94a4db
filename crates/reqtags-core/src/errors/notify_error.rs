//! Notification errors.

use super::error_code::{self, ReqTagsErrorCode};

/// Errors raised while delivering notices.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to deliver to {recipient}: {message}")]
    DeliveryFailed { recipient: String, message: String },

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),
}

impl ReqTagsErrorCode for NotifyError {
    fn error_code(&self) -> &'static str {
        error_code::NOTIFY_ERROR
    }
}
