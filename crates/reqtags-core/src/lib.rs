//! # reqtags-core
//!
//! Foundation crate for the required tags auditor.
//! Defines the configuration schema, domain types, host-facing traits,
//! errors, events, tracing setup, and constants. The storage and audit
//! crates both depend on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod traits;
pub mod types;

pub use config::{AlertSchedule, AlertSettings, AuditorConfig, ConfigOverrides, HumanDuration};
pub use errors::{AuditError, ConfigError, ReqTagsErrorCode};
pub use types::{
    Account, ActionKind, ActionStatus, Contact, Issue, IssueState, Resource, ResourceType, Tag,
};
pub use traits::{Cancellable, CancellationToken};
