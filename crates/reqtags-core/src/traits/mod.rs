//! Seams to the host: inventory, cloud calls, email, persistence.

pub mod cancellation;
pub mod cloud;
pub mod inventory;
pub mod notifier;
pub mod store;

pub use cancellation::{Cancellable, CancellationToken};
pub use cloud::CloudClient;
pub use inventory::ResourceInventory;
pub use notifier::{Notification, Notifier};
pub use store::{AuditTrail, IssueStore};
