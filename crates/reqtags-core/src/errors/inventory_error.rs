//! Inventory errors.

use super::error_code::{self, ReqTagsErrorCode};

/// Errors raised by the host resource inventory.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Failed to list {resource_type} resources: {message}")]
    ListFailed {
        resource_type: String,
        message: String,
    },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),
}

impl ReqTagsErrorCode for InventoryError {
    fn error_code(&self) -> &'static str {
        error_code::INVENTORY_ERROR
    }
}
