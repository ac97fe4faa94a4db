//! S3 buckets: delete when empty, otherwise lock the bucket down and let a
//! lifecycle rule expire its contents.

use serde_json::json;

use reqtags_core::errors::ActionError;
use reqtags_core::traits::CloudClient;
use reqtags_core::types::{ActionKind, Resource, ResourceType};

use super::{property_metrics, ActionOutcome, ResourceHandler};

/// Statement id of the deny-uploads bucket policy.
pub const DENY_POLICY_SID: &str = "cinqDenyObjectUploads";

/// Id of the expiry lifecycle rule.
pub const LIFECYCLE_RULE_ID: &str = "cloudInquisitor";

/// Days before current and noncurrent objects expire under the lifecycle rule.
pub const LIFECYCLE_EXPIRY_DAYS: u32 = 3;

/// Bucket policy denying object uploads and downloads.
pub fn deny_uploads_policy(bucket: &str) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Id": "PutObjPolicy",
        "Statement": [{
            "Sid": DENY_POLICY_SID,
            "Effect": "Deny",
            "Principal": "*",
            "Action": ["s3:PutObject", "s3:GetObject"],
            "Resource": format!("arn:aws:s3:::{bucket}/*"),
        }],
    })
}

/// Lifecycle configuration expiring every object and version.
pub fn removal_lifecycle() -> serde_json::Value {
    json!({
        "Rules": [{
            "ID": LIFECYCLE_RULE_ID,
            "Status": "Enabled",
            "Filter": {"Prefix": ""},
            "Expiration": {"Days": LIFECYCLE_EXPIRY_DAYS},
            "NoncurrentVersionExpiration": {"NoncurrentDays": LIFECYCLE_EXPIRY_DAYS},
            "AbortIncompleteMultipartUpload": {"DaysAfterInitiation": LIFECYCLE_EXPIRY_DAYS},
        }],
    })
}

pub struct S3BucketHandler;

impl ResourceHandler for S3BucketHandler {
    fn resource_type(&self) -> &'static str {
        ResourceType::S3_BUCKET
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

        let has_objects = client.bucket_has_objects(resource)?;
        let has_versions = client.bucket_has_versions(resource)?;
        if !has_objects && !has_versions {
            client.delete_bucket(resource)?;
            return Ok(ActionOutcome::succeed(metrics));
        }

        let policy_exists = client
            .bucket_policy(resource)?
            .is_some_and(|policy| policy.contains(DENY_POLICY_SID));
        let lifecycle_exists = client
            .bucket_lifecycle_rule_ids(resource)?
            .iter()
            .any(|id| id == LIFECYCLE_RULE_ID);
        if policy_exists && lifecycle_exists {
            return Ok(ActionOutcome::ignored());
        }

        if !policy_exists {
            client.put_bucket_policy(resource, &deny_uploads_policy(&resource.id).to_string())?;
            tracing::info!(bucket = %resource.id, account_id = %resource.account_id, "added deny-uploads bucket policy");
        }
        if !lifecycle_exists {
            client.put_bucket_lifecycle(resource, &removal_lifecycle())?;
            tracing::info!(bucket = %resource.id, account_id = %resource.account_id, "added expiry lifecycle rule");
        }

        Ok(ActionOutcome::succeed(metrics))
    }
}
