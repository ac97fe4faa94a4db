//! EC2 instances: stop, then terminate.

use serde_json::json;

use reqtags_core::errors::ActionError;
use reqtags_core::traits::CloudClient;
use reqtags_core::types::{ActionKind, Resource, ResourceType};

use super::{ActionOutcome, ResourceHandler};

const STOPPED: &str = "stopped";
const TERMINATED: &str = "terminated";

pub struct Ec2InstanceHandler;

impl Ec2InstanceHandler {
    fn metrics(resource: &Resource) -> serde_json::Value {
        json!({
            "instance_type": resource.property("instance_type").cloned().unwrap_or_default(),
            "public_ip": resource.property("public_ip").cloned().unwrap_or_default(),
        })
    }
}

impl ResourceHandler for Ec2InstanceHandler {
    fn resource_type(&self) -> &'static str {
        ResourceType::EC2_INSTANCE
    }

    fn supports(&self, _action: ActionKind) -> bool {
        true
    }

    fn apply(
        &self,
        client: &dyn CloudClient,
        resource: &Resource,
        action: ActionKind,
    ) -> Result<ActionOutcome, ActionError> {
        let state = client.instance_state(resource)?;
        match action {
            ActionKind::Stop => {
                if state == STOPPED || state == TERMINATED {
                    return Ok(ActionOutcome::ignored());
                }
                client.stop_instance(resource)?;
            }
            ActionKind::Remove => {
                if state == TERMINATED {
                    return Ok(ActionOutcome::ignored());
                }
                client.terminate_instance(resource)?;
            }
        }
        Ok(ActionOutcome::succeed(Self::metrics(resource)))
    }
}
