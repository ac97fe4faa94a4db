//! Enforcement executor: applies stop/remove actions through the host's
//! cloud client, one handler per resource type.

pub mod ebs;
pub mod ec2;
pub mod s3;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use reqtags_core::errors::{ActionError, StorageError};
use reqtags_core::traits::{AuditTrail, CloudClient};
use reqtags_core::types::{ActionKind, ActionStatus, AuditLogEntry, EnforcementRecord, Resource};

/// Result of a handler run: the status plus metrics captured before the action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub status: ActionStatus,
    pub metrics: serde_json::Value,
}

impl ActionOutcome {
    pub fn succeed(metrics: serde_json::Value) -> Self {
        Self {
            status: ActionStatus::Succeed,
            metrics,
        }
    }

    pub fn ignored() -> Self {
        Self {
            status: ActionStatus::Ignored,
            metrics: json!({}),
        }
    }
}

/// Stop/remove logic for one resource type.
pub trait ResourceHandler: Send + Sync {
    fn resource_type(&self) -> &'static str;

    fn supports(&self, action: ActionKind) -> bool;

    fn apply(
        &self,
        client: &dyn CloudClient,
        resource: &Resource,
        action: ActionKind,
    ) -> Result<ActionOutcome, ActionError>;
}

/// Status of one `process_action` call, with the failure if there was one.
#[derive(Debug)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub error: Option<ActionError>,
}

/// Dispatches actions to the handler registered for the resource type.
pub struct ActionExecutor {
    client: Arc<dyn CloudClient>,
    trail: Arc<dyn AuditTrail>,
    handlers: BTreeMap<&'static str, Box<dyn ResourceHandler>>,
}

impl ActionExecutor {
    /// Executor with the EC2 instance, S3 bucket and EBS volume handlers.
    pub fn new(client: Arc<dyn CloudClient>, trail: Arc<dyn AuditTrail>) -> Self {
        let mut executor = Self {
            client,
            trail,
            handlers: BTreeMap::new(),
        };
        executor.register(Box::new(ec2::Ec2InstanceHandler));
        executor.register(Box::new(s3::S3BucketHandler));
        executor.register(Box::new(ebs::EbsVolumeHandler));
        executor
    }

    /// Register a handler, replacing any handler for the same type.
    pub fn register(&mut self, handler: Box<dyn ResourceHandler>) {
        self.handlers.insert(handler.resource_type(), handler);
    }

    pub fn supports(&self, resource_type: &str, action: ActionKind) -> bool {
        self.handlers
            .get(resource_type)
            .is_some_and(|h| h.supports(action))
    }

    /// Apply `action` to `resource`.
    ///
    /// Provider failures and unsupported actions come back as
    /// `ActionStatus::Failed`; only audit trail writes can fail the call.
    /// Every attempt is audit logged as `{issuer}.{type}.{action}.{status}`;
    /// successful actions are also recorded as enforcements.
    pub fn process_action(
        &self,
        resource: &Resource,
        action: ActionKind,
        issuer: &str,
        now: DateTime<Utc>,
    ) -> Result<ActionResult, StorageError> {
        let resource_type = resource.resource_type.as_str();
        let attempt = match self.handlers.get(resource_type) {
            Some(handler) if handler.supports(action) => {
                handler.apply(self.client.as_ref(), resource, action)
            }
            _ => Err(ActionError::Unsupported {
                resource_type: resource_type.to_string(),
                action: action.to_string(),
            }),
        };

        let (status, metrics, error) = match attempt {
            Ok(outcome) => (outcome.status, outcome.metrics, None),
            Err(e) => {
                tracing::error!(
                    resource_id = %resource.id,
                    resource_type,
                    action = %action,
                    error = %e,
                    "failed to apply action"
                );
                (ActionStatus::Failed, json!({}), Some(e))
            }
        };

        self.trail.record_event(&AuditLogEntry::new(
            format!("{issuer}.{resource_type}.{action}.{status}"),
            issuer,
            json!({
                "resource_id": resource.id,
                "account_id": resource.account_id,
                "location": resource.location,
            }),
            now,
        ))?;

        if status == ActionStatus::Succeed {
            self.trail.record_enforcement(&EnforcementRecord {
                account_id: resource.account_id.clone(),
                resource_id: resource.id.clone(),
                resource_type: resource.resource_type.clone(),
                action,
                status,
                metrics,
                created: now,
            })?;
        }

        tracing::info!(
            resource_id = %resource.id,
            resource_type,
            action = %action,
            action_status = %status,
            "enforcement action processed"
        );
        Ok(ActionResult { status, error })
    }
}

/// Type-specific properties as a JSON object, for enforcement metrics.
pub(crate) fn property_metrics(resource: &Resource) -> serde_json::Value {
    serde_json::Value::Object(
        resource
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}
