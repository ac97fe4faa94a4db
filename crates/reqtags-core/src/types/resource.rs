//! Resources, tags, and accounts as the host inventory reports them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host resource type identifier, e.g. `aws_ec2_instance`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    pub const EC2_INSTANCE: &'static str = "aws_ec2_instance";
    pub const S3_BUCKET: &'static str = "aws_s3_bucket";
    pub const EBS_VOLUME: &'static str = "aws_ebs_volume";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn ec2_instance() -> Self {
        Self::new(Self::EC2_INSTANCE)
    }

    pub fn s3_bucket() -> Self {
        Self::new(Self::S3_BUCKET)
    }

    pub fn ebs_volume() -> Self {
        Self::new(Self::EBS_VOLUME)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A key/value metadata tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A cloud resource from the host inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub resource_type: ResourceType,
    pub account_id: String,
    /// Region or zone.
    pub location: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Launch or creation time.
    pub created: DateTime<Utc>,
    /// Provider-reported lifecycle state (`running`, `stopped`, ...).
    #[serde(default)]
    pub state: Option<String>,
    /// Type-specific attributes (`instance_type`, `public_ip`, `size`, ...).
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl Resource {
    /// Look up a tag value by key, ignoring key case.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key.eq_ignore_ascii_case(key))
            .map(|t| t.value.as_str())
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tag(key).is_some()
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }
}

/// A notification contact attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    /// Contact channel; only `email` is delivered by this crate's notifier.
    pub kind: String,
    pub value: String,
}

impl Contact {
    pub const EMAIL: &'static str = "email";

    pub fn email(address: impl Into<String>) -> Self {
        Self {
            kind: Self::EMAIL.to_string(),
            value: address.into(),
        }
    }

    pub fn is_email(&self) -> bool {
        self.kind == Self::EMAIL
    }
}

/// A cloud account known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}
