//! Test fakes for the host seams: an in-memory inventory, a scripted cloud
//! client and a recording notifier, plus resource builders.
//!
//! Panics on poisoned locks are fine here; this crate is test-only.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use reqtags_core::errors::{ActionError, InventoryError, NotifyError};
use reqtags_core::traits::{CloudClient, Notification, Notifier, ResourceInventory};
use reqtags_core::types::{Account, Contact, Resource, ResourceType, Tag};

/// Fixed reference instant used across tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// A resource created a year before [`t0`], outside any grace period.
pub fn resource(id: &str, resource_type: ResourceType, account_id: &str) -> Resource {
    Resource {
        id: id.to_string(),
        resource_type,
        account_id: account_id.to_string(),
        location: "us-west-2".to_string(),
        tags: Vec::new(),
        created: t0() - chrono::Duration::days(365),
        state: Some("running".to_string()),
        properties: BTreeMap::new(),
    }
}

pub fn ec2(id: &str, account_id: &str) -> Resource {
    let mut r = resource(id, ResourceType::ec2_instance(), account_id);
    r.properties
        .insert("instance_type".to_string(), serde_json::json!("t3.micro"));
    r.properties
        .insert("public_ip".to_string(), serde_json::json!("203.0.113.7"));
    r
}

pub fn s3(id: &str, account_id: &str) -> Resource {
    resource(id, ResourceType::s3_bucket(), account_id)
}

pub fn ebs(id: &str, account_id: &str) -> Resource {
    let mut r = resource(id, ResourceType::ebs_volume(), account_id);
    r.properties.insert("size".to_string(), serde_json::json!(100));
    r
}

pub fn with_tags(mut resource: Resource, tags: &[(&str, &str)]) -> Resource {
    resource.tags = tags.iter().map(|(k, v)| Tag::new(*k, *v)).collect();
    resource
}

pub fn account(id: &str, name: &str, emails: &[&str]) -> Account {
    Account {
        id: id.to_string(),
        name: name.to_string(),
        contacts: emails.iter().map(|e| Contact::email(*e)).collect(),
    }
}

/// Inventory backed by mutable in-memory lists.
#[derive(Default)]
pub struct FakeInventory {
    resources: Mutex<Vec<Resource>>,
    accounts: Mutex<Vec<Account>>,
    failing_types: Mutex<BTreeSet<String>>,
}

impl FakeInventory {
    pub fn new(accounts: Vec<Account>, resources: Vec<Resource>) -> Self {
        Self {
            resources: Mutex::new(resources),
            accounts: Mutex::new(accounts),
            failing_types: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn set_resources(&self, resources: Vec<Resource>) {
        *self.resources.lock().unwrap() = resources;
    }

    pub fn upsert(&self, resource: Resource) {
        let mut all = self.resources.lock().unwrap();
        all.retain(|r| r.id != resource.id);
        all.push(resource);
    }

    pub fn remove(&self, resource_id: &str) {
        self.resources.lock().unwrap().retain(|r| r.id != resource_id);
    }

    /// Make listings of `resource_type` fail until cleared.
    pub fn fail_type(&self, resource_type: &str, failing: bool) {
        let mut set = self.failing_types.lock().unwrap();
        if failing {
            set.insert(resource_type.to_string());
        } else {
            set.remove(resource_type);
        }
    }
}

impl ResourceInventory for FakeInventory {
    fn resources(&self, resource_type: &ResourceType) -> Result<Vec<Resource>, InventoryError> {
        if self.failing_types.lock().unwrap().contains(resource_type.as_str()) {
            return Err(InventoryError::ListFailed {
                resource_type: resource_type.to_string(),
                message: "inventory unavailable".to_string(),
            });
        }
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.resource_type == resource_type)
            .cloned()
            .collect())
    }

    fn account(&self, account_id: &str) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == account_id)
            .cloned()
    }

    fn accounts(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }
}

/// Provider-side state of one bucket.
#[derive(Debug, Clone, Default)]
pub struct BucketState {
    pub has_objects: bool,
    pub has_versions: bool,
    pub policy: Option<String>,
    pub lifecycle_rule_ids: Vec<String>,
}

/// Cloud client that mutates in-memory provider state and records calls.
#[derive(Default)]
pub struct FakeCloud {
    instances: Mutex<HashMap<String, String>>,
    buckets: Mutex<HashMap<String, BucketState>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<BTreeSet<String>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_instance_state(&self, instance_id: &str, state: &str) {
        self.instances
            .lock()
            .unwrap()
            .insert(instance_id.to_string(), state.to_string());
    }

    pub fn instance_state_of(&self, instance_id: &str) -> Option<String> {
        self.instances.lock().unwrap().get(instance_id).cloned()
    }

    pub fn set_bucket(&self, bucket: &str, state: BucketState) {
        self.buckets.lock().unwrap().insert(bucket.to_string(), state);
    }

    pub fn bucket(&self, bucket: &str) -> Option<BucketState> {
        self.buckets.lock().unwrap().get(bucket).cloned()
    }

    /// Make every mutating call on `resource_id` fail.
    pub fn fail_resource(&self, resource_id: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(resource_id.to_string());
        } else {
            set.remove(resource_id);
        }
    }

    /// Calls made so far, as `"{method}:{resource_id}"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &str, resource: &Resource) -> Result<(), ActionError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{method}:{}", resource.id));
        if self.failing.lock().unwrap().contains(&resource.id) {
            return Err(ActionError::Provider(format!("{method} rejected")));
        }
        Ok(())
    }

    fn with_bucket<T>(
        &self,
        resource: &Resource,
        f: impl FnOnce(&mut BucketState) -> T,
    ) -> Result<T, ActionError> {
        let mut buckets = self.buckets.lock().unwrap();
        buckets
            .get_mut(&resource.id)
            .map(f)
            .ok_or_else(|| ActionError::Provider(format!("no such bucket {}", resource.id)))
    }
}

impl CloudClient for FakeCloud {
    fn instance_state(&self, resource: &Resource) -> Result<String, ActionError> {
        Ok(self
            .instance_state_of(&resource.id)
            .unwrap_or_else(|| "running".to_string()))
    }

    fn stop_instance(&self, resource: &Resource) -> Result<(), ActionError> {
        self.record("stop_instance", resource)?;
        self.set_instance_state(&resource.id, "stopped");
        Ok(())
    }

    fn terminate_instance(&self, resource: &Resource) -> Result<(), ActionError> {
        self.record("terminate_instance", resource)?;
        self.set_instance_state(&resource.id, "terminated");
        Ok(())
    }

    fn bucket_has_objects(&self, resource: &Resource) -> Result<bool, ActionError> {
        self.with_bucket(resource, |b| b.has_objects)
    }

    fn bucket_has_versions(&self, resource: &Resource) -> Result<bool, ActionError> {
        self.with_bucket(resource, |b| b.has_versions)
    }

    fn bucket_policy(&self, resource: &Resource) -> Result<Option<String>, ActionError> {
        self.with_bucket(resource, |b| b.policy.clone())
    }

    fn put_bucket_policy(&self, resource: &Resource, policy: &str) -> Result<(), ActionError> {
        self.record("put_bucket_policy", resource)?;
        self.with_bucket(resource, |b| b.policy = Some(policy.to_string()))
    }

    fn bucket_lifecycle_rule_ids(&self, resource: &Resource) -> Result<Vec<String>, ActionError> {
        self.with_bucket(resource, |b| b.lifecycle_rule_ids.clone())
    }

    fn put_bucket_lifecycle(
        &self,
        resource: &Resource,
        configuration: &serde_json::Value,
    ) -> Result<(), ActionError> {
        self.record("put_bucket_lifecycle", resource)?;
        let ids: Vec<String> = configuration["Rules"]
            .as_array()
            .map(|rules| {
                rules
                    .iter()
                    .filter_map(|r| r["ID"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        self.with_bucket(resource, |b| b.lifecycle_rule_ids.extend(ids))
    }

    fn delete_bucket(&self, resource: &Resource) -> Result<(), ActionError> {
        self.record("delete_bucket", resource)?;
        self.buckets.lock().unwrap().remove(&resource.id);
        Ok(())
    }

    fn delete_volume(&self, resource: &Resource) -> Result<(), ActionError> {
        self.record("delete_volume", resource)
    }
}

/// Notifier that keeps every notification it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    rejected: Mutex<BTreeSet<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Notifications addressed to `email`.
    pub fn sent_to(&self, email: &str) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.recipients.iter().any(|c| c.value.eq_ignore_ascii_case(email)))
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Fail deliveries to `email`.
    pub fn reject(&self, email: &str) {
        self.rejected.lock().unwrap().insert(email.to_lowercase());
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let rejected = self.rejected.lock().unwrap();
        if let Some(contact) = notification
            .recipients
            .iter()
            .find(|c| rejected.contains(&c.value.to_lowercase()))
        {
            return Err(NotifyError::DeliveryFailed {
                recipient: contact.value.clone(),
                message: "mailbox unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
