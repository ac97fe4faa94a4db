//! # reqtags-storage
//!
//! SQLite persistence for issues, the audit log, and enforcement history.
//! Single serialized writer plus round-robin read connections; schema managed
//! through `PRAGMA user_version` migrations.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod retention;
pub mod store;

pub use connection::DatabaseManager;
pub use retention::{purge_audit_log, RetentionReport};
pub use store::SqliteStore;
