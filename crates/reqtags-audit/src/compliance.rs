//! Tag evaluation: decides whether a resource carries the required tags.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use reqtags_core::config::AuditorConfig;
use reqtags_core::constants::{OWNER_NOT_EMAIL_NOTE, OWNER_TAG};
use reqtags_core::types::Resource;

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

static EMAIL_SEARCH: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());
static EMAIL_FULL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(&format!("^(?:{EMAIL_PATTERN})$")).ok());

/// Check an owner tag value for an email address.
///
/// With `partial`, the address may appear anywhere in the value
/// (`"Team X <x@example.com>"`); otherwise the whole value must be one.
pub fn validate_email(value: &str, partial: bool) -> bool {
    let re = if partial { &*EMAIL_SEARCH } else { &*EMAIL_FULL };
    re.as_ref().is_some_and(|re| re.is_match(value.trim()))
}

/// Email addresses found in the resource's owner tag.
pub fn owner_emails(resource: &Resource, partial: bool) -> Vec<String> {
    let Some(value) = resource.tag(OWNER_TAG) else {
        return Vec::new();
    };
    let value = value.trim();
    if partial {
        EMAIL_SEARCH
            .as_ref()
            .map(|re| re.find_iter(value).map(|m| m.as_str().to_string()).collect())
            .unwrap_or_default()
    } else if validate_email(value, false) {
        vec![value.to_string()]
    } else {
        Vec::new()
    }
}

/// Outcome of evaluating one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compliance {
    /// Carries the ignore tag.
    Exempt,
    /// Younger than the grace period; not evaluated yet.
    InGracePeriod,
    Compliant,
    NonCompliant {
        missing_tags: Vec<String>,
        notes: Vec<String>,
    },
}

impl Compliance {
    pub fn is_non_compliant(&self) -> bool {
        matches!(self, Self::NonCompliant { .. })
    }
}

/// Evaluates resources against the required tag policy.
#[derive(Debug, Clone)]
pub struct TagEvaluator {
    required_tags: Vec<String>,
    ignore_tag: String,
    grace_period: Duration,
    partial_owner_match: bool,
}

impl TagEvaluator {
    pub fn new(
        required_tags: Vec<String>,
        ignore_tag: impl Into<String>,
        grace_period: Duration,
        partial_owner_match: bool,
    ) -> Self {
        Self {
            required_tags: required_tags.into_iter().map(|t| t.to_lowercase()).collect(),
            ignore_tag: ignore_tag.into(),
            grace_period,
            partial_owner_match,
        }
    }

    pub fn from_config(config: &AuditorConfig) -> Self {
        Self::new(
            config.effective_required_tags(),
            config.effective_audit_ignore_tag(),
            config.effective_grace_period(),
            config.allows_partial_owner_match(),
        )
    }

    pub fn required_tags(&self) -> &[String] {
        &self.required_tags
    }

    pub fn partial_owner_match(&self) -> bool {
        self.partial_owner_match
    }

    /// A grace period reaching past the earliest representable time covers
    /// every resource.
    fn in_grace_period(&self, resource: &Resource, now: DateTime<Utc>) -> bool {
        match now.checked_sub_signed(self.grace_period) {
            Some(start) => resource.created > start,
            None => true,
        }
    }

    pub fn evaluate(&self, resource: &Resource, now: DateTime<Utc>) -> Compliance {
        if resource.has_tag(&self.ignore_tag) {
            return Compliance::Exempt;
        }
        if self.grace_period > Duration::zero() && self.in_grace_period(resource, now) {
            return Compliance::InGracePeriod;
        }

        let mut missing_tags = Vec::new();
        let mut notes = Vec::new();
        for key in &self.required_tags {
            match resource.tag(key) {
                None => missing_tags.push(key.clone()),
                Some(value) if key == OWNER_TAG && !validate_email(value, self.partial_owner_match) => {
                    missing_tags.push(key.clone());
                    notes.push(OWNER_NOT_EMAIL_NOTE.to_string());
                }
                Some(_) => {}
            }
        }

        if missing_tags.is_empty() {
            return Compliance::Compliant;
        }
        missing_tags.sort();
        notes.sort();
        Compliance::NonCompliant {
            missing_tags,
            notes,
        }
    }
}
