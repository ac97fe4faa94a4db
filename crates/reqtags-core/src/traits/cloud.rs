//! Cloud provider primitives used by the enforcement executor.

use crate::errors::ActionError;
use crate::types::Resource;

/// Provider calls needed to stop or remove resources.
///
/// The host implements these against its cloud SDK, resolving credentials
/// and region from `resource.account_id` and `resource.location`. Methods a
/// host does not support keep the default, which reports `Unsupported`.
pub trait CloudClient: Send + Sync {
    /// Current provider state of an instance (`running`, `stopped`, `terminated`, ...).
    fn instance_state(&self, resource: &Resource) -> Result<String, ActionError> {
        Err(unsupported(resource, "instance_state"))
    }

    fn stop_instance(&self, resource: &Resource) -> Result<(), ActionError> {
        Err(unsupported(resource, "stop_instance"))
    }

    fn terminate_instance(&self, resource: &Resource) -> Result<(), ActionError> {
        Err(unsupported(resource, "terminate_instance"))
    }

    /// Whether the bucket holds at least one object.
    fn bucket_has_objects(&self, resource: &Resource) -> Result<bool, ActionError> {
        Err(unsupported(resource, "bucket_has_objects"))
    }

    /// Whether the bucket holds at least one object version.
    fn bucket_has_versions(&self, resource: &Resource) -> Result<bool, ActionError> {
        Err(unsupported(resource, "bucket_has_versions"))
    }

    /// The bucket policy document, `None` when the bucket has no policy.
    fn bucket_policy(&self, resource: &Resource) -> Result<Option<String>, ActionError> {
        Err(unsupported(resource, "bucket_policy"))
    }

    fn put_bucket_policy(&self, resource: &Resource, _policy: &str) -> Result<(), ActionError> {
        Err(unsupported(resource, "put_bucket_policy"))
    }

    /// Ids of the bucket's lifecycle rules; empty when none are configured.
    fn bucket_lifecycle_rule_ids(&self, resource: &Resource) -> Result<Vec<String>, ActionError> {
        Err(unsupported(resource, "bucket_lifecycle_rule_ids"))
    }

    fn put_bucket_lifecycle(
        &self,
        resource: &Resource,
        _configuration: &serde_json::Value,
    ) -> Result<(), ActionError> {
        Err(unsupported(resource, "put_bucket_lifecycle"))
    }

    fn delete_bucket(&self, resource: &Resource) -> Result<(), ActionError> {
        Err(unsupported(resource, "delete_bucket"))
    }

    fn delete_volume(&self, resource: &Resource) -> Result<(), ActionError> {
        Err(unsupported(resource, "delete_volume"))
    }
}

fn unsupported(resource: &Resource, action: &str) -> ActionError {
    ActionError::Unsupported {
        resource_type: resource.resource_type.to_string(),
        action: action.to_string(),
    }
}
