//! EBS volumes: removal only.

use reqtags_core::errors::ActionError;
use reqtags_core::traits::CloudClient;
use reqtags_core::types::{ActionKind, Resource, ResourceType};

use super::{property_metrics, ActionOutcome, ResourceHandler};

pub struct EbsVolumeHandler;

impl ResourceHandler for EbsVolumeHandler {
    fn resource_type(&self) -> &'static str {
        ResourceType::EBS_VOLUME
    }

    fn supports(&self, action: ActionKind) -> bool {
        action == ActionKind::Remove
    }

    fn apply(
        &self,
        client: &dyn CloudClient,
        resource: &Resource,
        _action: ActionKind,
    ) -> Result<ActionOutcome, ActionError> {
        let metrics = property_metrics(resource);
        client.delete_volume(resource)?;
        Ok(ActionOutcome::succeed(metrics))
    }
}
