//! Configuration errors.

use super::error_code::{self, ReqTagsErrorCode};

/// Errors from loading or checking the auditor configuration.
///
/// Validation errors name the dotted config field (for example
/// `alert_settings.aws_ec2_instance.stop`) and echo the rejected value so the
/// host can point the operator at the exact setting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("malformed config in {origin}: {message}")]
    Malformed { origin: String, message: String },

    #[error("{field} = {value}: {reason}")]
    Rejected {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field} = {value} exceeds the maximum of {max}")]
    OutOfRange {
        field: String,
        value: String,
        max: String,
    },
}

impl ConfigError {
    pub fn rejected(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::Rejected {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn out_of_range(field: impl Into<String>, value: impl ToString, max: impl ToString) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            max: max.to_string(),
        }
    }

    /// Config field the error refers to, when it came from validation.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Rejected { field, .. } | Self::OutOfRange { field, .. } => Some(field),
            Self::Unreadable { .. } | Self::Malformed { .. } => None,
        }
    }
}

impl ReqTagsErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unreadable { .. } => error_code::CONFIG_UNREADABLE,
            Self::Malformed { .. } => error_code::CONFIG_MALFORMED,
            Self::Rejected { .. } => error_code::CONFIG_REJECTED,
            Self::OutOfRange { .. } => error_code::CONFIG_OUT_OF_RANGE,
        }
    }
}
