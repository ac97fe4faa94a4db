//! Error handling for the auditor.
//! One error enum per subsystem, `thiserror` only.

pub mod action_error;
pub mod audit_error;
pub mod config_error;
pub mod duration_error;
pub mod error_code;
pub mod inventory_error;
pub mod notify_error;
pub mod storage_error;

pub use action_error::ActionError;
pub use audit_error::{AuditError, RunErrors};
pub use config_error::ConfigError;
pub use duration_error::DurationError;
pub use error_code::ReqTagsErrorCode;
pub use inventory_error::InventoryError;
pub use notify_error::NotifyError;
pub use storage_error::StorageError;
