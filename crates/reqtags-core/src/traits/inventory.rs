//! Host resource inventory.

use crate::errors::InventoryError;
use crate::types::{Account, Resource, ResourceType};

/// Read access to the host's resource and account inventory.
pub trait ResourceInventory: Send + Sync {
    /// All resources of one type across accounts.
    fn resources(&self, resource_type: &ResourceType) -> Result<Vec<Resource>, InventoryError>;

    /// Look up one account by id.
    fn account(&self, account_id: &str) -> Option<Account>;

    /// All accounts, used to resolve account names in listings.
    fn accounts(&self) -> Vec<Account>;
}
