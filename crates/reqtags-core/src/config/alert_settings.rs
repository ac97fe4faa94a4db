//! Per-resource-type alert and enforcement schedules.
//!
//! The host stores this block JSON-encoded; the project TOML may also give
//! it as a native table. Both forms deserialize into [`AlertSettings`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::duration::HumanDuration;
use crate::constants::{MAX_SCHEDULE_OFFSET_DAYS, SCOPE_WILDCARD, SETTINGS_FALLBACK_KEY};
use crate::errors::ConfigError;

/// Alert offsets, stop and remove offsets, and account scope for one
/// resource type. Every offset is measured from first detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSchedule {
    #[serde(default)]
    pub alert: Vec<HumanDuration>,
    pub stop: HumanDuration,
    pub remove: HumanDuration,
    #[serde(default = "default_scope")]
    pub scope: Vec<String>,
}

fn default_scope() -> Vec<String> {
    vec![SCOPE_WILDCARD.to_string()]
}

impl AlertSchedule {
    /// Whether this schedule covers the given account (by id or name).
    pub fn applies_to(&self, account_id: &str, account_name: Option<&str>) -> bool {
        self.scope.iter().any(|s| {
            s == SCOPE_WILDCARD || s == account_id || account_name.is_some_and(|n| s == n)
        })
    }

    /// Number of alert offsets that have elapsed.
    pub fn alerts_due(&self, elapsed: HumanDuration) -> u32 {
        let due = self.alert.iter().filter(|offset| **offset <= elapsed).count();
        u32::try_from(due).unwrap_or(u32::MAX)
    }

    /// Earliest alert offset strictly after `elapsed`.
    pub fn next_alert_after(&self, elapsed: HumanDuration) -> Option<HumanDuration> {
        self.alert.iter().copied().find(|offset| *offset > elapsed)
    }

    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        let field = |name: &str| format!("alert_settings.{key}.{name}");
        let max = HumanDuration::from_days(MAX_SCHEDULE_OFFSET_DAYS);

        if self.stop.is_zero() {
            return Err(ConfigError::rejected(field("stop"), self.stop, "must be a positive duration"));
        }
        if self.remove.is_zero() {
            return Err(ConfigError::rejected(field("remove"), self.remove, "must be a positive duration"));
        }
        if self.stop > max {
            return Err(ConfigError::out_of_range(field("stop"), self.stop, max));
        }
        if self.remove > max {
            return Err(ConfigError::out_of_range(field("remove"), self.remove, max));
        }
        if let Some(offset) = self.alert.iter().find(|offset| **offset > max) {
            return Err(ConfigError::out_of_range(field("alert"), offset, max));
        }
        if self.remove < self.stop {
            return Err(ConfigError::rejected(
                field("remove"),
                self.remove,
                format!("must not be earlier than stop ({})", self.stop),
            ));
        }
        if let Some(pair) = self.alert.windows(2).find(|w| w[1] < w[0]) {
            return Err(ConfigError::rejected(
                field("alert"),
                pair[1],
                format!("offsets must be non-decreasing (follows {})", pair[0]),
            ));
        }
        if self.scope.is_empty() || self.scope.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::rejected(
                field("scope"),
                format!("{:?}", self.scope),
                "must list account ids or \"*\"",
            ));
        }
        Ok(())
    }
}

impl Default for AlertSchedule {
    fn default() -> Self {
        Self {
            alert: vec![
                HumanDuration::ZERO,
                HumanDuration::from_weeks(3),
                HumanDuration::from_days(27),
            ],
            stop: HumanDuration::from_weeks(4),
            remove: HumanDuration::from_weeks(12),
            scope: default_scope(),
        }
    }
}

/// Mapping of resource type to its schedule. `*` is the fallback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AlertSettings {
    schedules: BTreeMap<String, AlertSchedule>,
}

impl AlertSettings {
    pub fn new(schedules: BTreeMap<String, AlertSchedule>) -> Self {
        Self { schedules }
    }

    /// Parse the JSON-encoded form the host stores.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let schedules = serde_json::from_str(json).map_err(|e| ConfigError::Malformed {
            origin: "alert_settings".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { schedules })
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(&self.schedules).map_err(|e| ConfigError::Malformed {
            origin: "alert_settings".to_string(),
            message: e.to_string(),
        })
    }

    /// Resolve the schedule for a resource type and account.
    ///
    /// The exact resource type entry wins over `*`; an entry whose scope
    /// does not include the account is skipped.
    pub fn schedule_for(
        &self,
        resource_type: &str,
        account_id: &str,
        account_name: Option<&str>,
    ) -> Option<&AlertSchedule> {
        [resource_type, SETTINGS_FALLBACK_KEY]
            .into_iter()
            .filter_map(|key| self.schedules.get(key))
            .find(|schedule| schedule.applies_to(account_id, account_name))
    }

    pub fn get(&self, resource_type: &str) -> Option<&AlertSchedule> {
        self.schedules.get(resource_type)
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AlertSchedule)> {
        self.schedules.iter()
    }

    /// Check every entry: positive stop/remove no later than 100 years,
    /// remove not before stop, non-decreasing alerts, non-empty scope.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, schedule) in &self.schedules {
            if key.trim().is_empty() {
                return Err(ConfigError::rejected(
                    "alert_settings",
                    format!("{key:?}"),
                    "resource type keys must not be empty",
                ));
            }
            schedule.validate(key)?;
        }
        Ok(())
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        let mut schedules = BTreeMap::new();
        schedules.insert(SETTINGS_FALLBACK_KEY.to_string(), AlertSchedule::default());
        Self { schedules }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAlertSettings {
    Encoded(String),
    Table(BTreeMap<String, AlertSchedule>),
}

impl<'de> Deserialize<'de> for AlertSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawAlertSettings::deserialize(deserializer)? {
            RawAlertSettings::Table(schedules) => Ok(Self { schedules }),
            RawAlertSettings::Encoded(json) => {
                Self::from_json(&json).map_err(serde::de::Error::custom)
            }
        }
    }
}
