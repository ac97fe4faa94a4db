//! Event system for the auditor.
//! Trait with no-op defaults, synchronous dispatch, zero overhead when empty.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::AuditEventDispatcher;
pub use handler::AuditEventHandler;
pub use types::*;
