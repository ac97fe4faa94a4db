//! Duration parsing errors.

use super::error_code::{self, ReqTagsErrorCode};

/// Errors raised while parsing a free-text `"<N> <unit>"` duration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("expected a number in duration {input:?}")]
    MissingNumber { input: String },

    #[error("missing unit after {number} in duration {input:?}")]
    MissingUnit { input: String, number: u64 },

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { input: String, unit: String },

    #[error("duration {input:?} is too large")]
    Overflow { input: String },
}

impl ReqTagsErrorCode for DurationError {
    fn error_code(&self) -> &'static str {
        error_code::DURATION_ERROR
    }
}
