//! Shared constants for the required tags auditor.

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Namespace used as the audit log actor and in audit event names.
pub const NAMESPACE: &str = "auditor_required_tags";

/// Human-readable subsystem name used on notifications.
pub const SUBSYSTEM_NAME: &str = "Required Tags Compliance";

/// Prefix of issue identifiers.
pub const ISSUE_ID_PREFIX: &str = "reqtag";

/// Key in `alert_settings` used when a resource type has no entry.
pub const SETTINGS_FALLBACK_KEY: &str = "*";

/// Scope entry that matches every account.
pub const SCOPE_WILDCARD: &str = "*";

/// Required tag key that must hold a valid email address.
pub const OWNER_TAG: &str = "owner";

/// Note attached to an issue whose owner tag is not an email address.
pub const OWNER_NOT_EMAIL_NOTE: &str = "Owner tag is not a valid email address";

// ---- Defaults ----

/// Default run interval in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 30;

/// Default required tag keys.
pub const DEFAULT_REQUIRED_TAGS: [&str; 3] = ["owner", "accounting", "name"];

/// Default audited resource type.
pub const DEFAULT_AUDIT_SCOPE: &str = "aws_ec2_instance";

/// Default tag that exempts a resource from the audit.
pub const DEFAULT_AUDIT_IGNORE_TAG: &str = "cinq_ignore";

/// Default grace period for newly created resources, in hours.
pub const DEFAULT_GRACE_PERIOD_HOURS: u32 = 4;

/// Default subject of new-issue notices.
pub const DEFAULT_EMAIL_SUBJECT: &str = "Resources missing required tags";

/// Default subject of fixed-issue notices.
pub const DEFAULT_EMAIL_SUBJECT_FIXED: &str = "Fixed resources missing required tags";

/// Default audit log retention in days.
pub const DEFAULT_AUDIT_LOG_RETENTION_DAYS: u32 = 90;

/// Longest accepted grace period, in hours (100 years).
pub const MAX_GRACE_PERIOD_HOURS: u32 = 876_000;

/// Longest accepted audit log retention, in days (100 years).
pub const MAX_AUDIT_LOG_RETENTION_DAYS: u32 = 36_500;

/// Longest accepted alert, stop or remove offset, in days (100 years).
pub const MAX_SCHEDULE_OFFSET_DAYS: u64 = 36_500;

/// Default page size for issue listings.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// ---- Audit log events ----

pub const EVENT_CONFIRM: &str = "requiredTags.confirm";
pub const EVENT_ISSUE_REMOVED: &str = "requiredTags.issue_removed";
pub const EVENT_RUN_COMPLETE: &str = "requiredTags.run_complete";
