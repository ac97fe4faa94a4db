//! # reqtags-audit
//!
//! The required tags auditor: evaluates resources against the required tag
//! policy, tracks issues through their alert and enforcement schedule,
//! applies stop/remove actions through the host's cloud client, and sends
//! aggregated notices.

pub mod auditor;
pub mod compliance;
pub mod enforcement;
pub mod notify;
pub mod report;
pub mod runner;
pub mod schedule;

pub use auditor::{ActionTaken, Collaborators, RequiredTagsAuditor, RunReport};
pub use compliance::{validate_email, Compliance, TagEvaluator};
pub use enforcement::ActionExecutor;
pub use report::{export_issues, list_issues, IssueListing, ListQuery};
pub use runner::AuditRunner;
pub use schedule::{decide, Decision, EnforcementPolicy};
