//! Structured span field names used across the auditor crates.

/// Issue id (`reqtag-...`).
pub const ISSUE_ID: &str = "issue_id";

/// Cloud resource id.
pub const RESOURCE_ID: &str = "resource_id";

/// Resource type, e.g. `aws_ec2_instance`.
pub const RESOURCE_TYPE: &str = "resource_type";

/// Account id.
pub const ACCOUNT_ID: &str = "account_id";

/// Enforcement action (`stop`, `remove`).
pub const ACTION: &str = "action";

/// Enforcement status (`succeed`, `failed`, `ignored`).
pub const ACTION_STATUS: &str = "action_status";

/// Auditor run: wall time in milliseconds.
pub const RUN_DURATION_MS: &str = "run_duration_ms";

/// Auditor run: resources evaluated.
pub const RESOURCES_CHECKED: &str = "resources_checked";

/// Storage: rows purged by retention.
pub const ROWS_PURGED: &str = "rows_purged";
