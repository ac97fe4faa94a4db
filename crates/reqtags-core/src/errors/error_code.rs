//! ReqTagsErrorCode trait for host-facing error codes.

/// Trait giving every error enum a stable, machine-readable code.
/// The host logs and surfaces these codes next to the message.
pub trait ReqTagsErrorCode {
    /// Returns the error code string (e.g., "CONFIG_REJECTED").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_UNREADABLE: &str = "CONFIG_UNREADABLE";
pub const CONFIG_MALFORMED: &str = "CONFIG_MALFORMED";
pub const CONFIG_REJECTED: &str = "CONFIG_REJECTED";
pub const CONFIG_OUT_OF_RANGE: &str = "CONFIG_OUT_OF_RANGE";
pub const DURATION_ERROR: &str = "DURATION_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const ISSUE_NOT_FOUND: &str = "ISSUE_NOT_FOUND";
pub const ACTION_FAILED: &str = "ACTION_FAILED";
pub const ACTION_UNSUPPORTED: &str = "ACTION_UNSUPPORTED";
pub const INVENTORY_ERROR: &str = "INVENTORY_ERROR";
pub const NOTIFY_ERROR: &str = "NOTIFY_ERROR";
pub const EXPORT_FAILED: &str = "EXPORT_FAILED";
pub const CANCELLED: &str = "CANCELLED";
