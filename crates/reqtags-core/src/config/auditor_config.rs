//! Top-level auditor configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use super::AlertSettings;
use crate::constants::*;
use crate::errors::ConfigError;

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "reqtags.toml";

/// Auditor configuration.
///
/// Every knob is optional in the file; `effective_*` accessors apply the
/// compiled defaults. Resolution order (highest priority first):
/// 1. Host overrides (applied via `apply_overrides`)
/// 2. Environment variables (`REQTAGS_*`)
/// 3. Project config (`reqtags.toml` in project root)
/// 4. User config (`~/.reqtags/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuditorConfig {
    /// Whether the host should run the auditor. Default: false.
    pub enabled: Option<bool>,
    /// How often the auditor executes, in minutes. Default: 30.
    pub interval: Option<u32>,
    /// Tag keys that must be present on audited resources.
    pub required_tags: Option<Vec<String>>,
    /// Resource type(s) to audit. Accepts a single string or a list.
    #[serde(deserialize_with = "one_or_many")]
    pub audit_scope: Option<Vec<String>>,
    /// Per-type alert/stop/remove offsets and account scope.
    pub alert_settings: Option<AlertSettings>,
    /// Tag key that exempts a resource from the audit.
    pub audit_ignore_tag: Option<String>,
    /// Do not stop or remove resources, only alert. Default: true.
    pub collect_only: Option<bool>,
    /// Require manual confirmation before stop/remove. Default: true.
    pub confirm_shutdown: Option<bool>,
    /// Accept an owner tag that merely contains an email. Default: true.
    pub partial_owner_match: Option<bool>,
    /// Email addresses that receive every notice.
    pub permanent_recipient: Option<Vec<String>>,
    /// Send notices even in collect mode. Default: true.
    pub always_send_email: Option<bool>,
    /// Subject of new-issue notices.
    pub email_subject: Option<String>,
    /// Subject of fixed-issue notices.
    pub email_subject_fixed: Option<String>,
    /// Resources younger than this many hours are skipped. Default: 4.
    pub grace_period: Option<u32>,
    /// Audit log entries older than this many days are purged. Default: 90.
    pub audit_log_retention_days: Option<u32>,
}

/// Overrides supplied by the host's own configuration store.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub enabled: Option<bool>,
    pub interval: Option<u32>,
    pub collect_only: Option<bool>,
    pub confirm_shutdown: Option<bool>,
    pub required_tags: Option<Vec<String>>,
    pub permanent_recipient: Option<Vec<String>>,
    pub alert_settings: Option<AlertSettings>,
}

impl AuditorConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::Malformed { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(path = %user_config_path.display(), error = %e, "ignoring user config");
                    }
                }
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(overrides) = overrides {
            Self::apply_overrides(&mut config, overrides);
        }

        Self::validate(&config)?;
        tracing::debug!(root = %root.display(), "auditor config loaded");

        Ok(config)
    }

    /// Load configuration from a TOML string (no layering).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Malformed {
            origin: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &AuditorConfig) -> Result<(), ConfigError> {
        if config.interval == Some(0) {
            return Err(ConfigError::rejected("interval", 0, "must be greater than 0"));
        }
        if let Some(ref tags) = config.required_tags {
            if tags.is_empty() {
                return Err(ConfigError::rejected("required_tags", "[]", "must list at least one tag"));
            }
            if let Some(blank) = tags.iter().find(|t| t.trim().is_empty()) {
                return Err(ConfigError::rejected(
                    "required_tags",
                    format!("{blank:?}"),
                    "tag keys must not be empty",
                ));
            }
        }
        if let Some(ref scope) = config.audit_scope {
            if scope.is_empty() || scope.iter().any(|s| s.trim().is_empty()) {
                return Err(ConfigError::rejected(
                    "audit_scope",
                    format!("{scope:?}"),
                    "must name at least one resource type",
                ));
            }
        }
        if let Some(ref tag) = config.audit_ignore_tag {
            if tag.trim().is_empty() {
                return Err(ConfigError::rejected("audit_ignore_tag", format!("{tag:?}"), "must not be empty"));
            }
        }
        if let Some(ref recipients) = config.permanent_recipient {
            if let Some(bad) = recipients.iter().find(|r| !looks_like_address(r)) {
                return Err(ConfigError::rejected(
                    "permanent_recipient",
                    format!("{bad:?}"),
                    "not an email address",
                ));
            }
        }
        if let Some(hours) = config.grace_period {
            if hours > MAX_GRACE_PERIOD_HOURS {
                return Err(ConfigError::out_of_range("grace_period", hours, MAX_GRACE_PERIOD_HOURS));
            }
        }
        match config.audit_log_retention_days {
            Some(0) => {
                return Err(ConfigError::rejected(
                    "audit_log_retention_days",
                    0,
                    "must be greater than 0",
                ));
            }
            Some(days) if days > MAX_AUDIT_LOG_RETENTION_DAYS => {
                return Err(ConfigError::out_of_range(
                    "audit_log_retention_days",
                    days,
                    MAX_AUDIT_LOG_RETENTION_DAYS,
                ));
            }
            _ => {}
        }
        if let Some(ref settings) = config.alert_settings {
            settings.validate()?;
        }
        Ok(())
    }

    // ---- Effective values ----

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn effective_interval(&self) -> u32 {
        self.interval.unwrap_or(DEFAULT_INTERVAL_MINUTES)
    }

    /// Required tag keys, lower-cased, de-duplicated, in first-seen order.
    pub fn effective_required_tags(&self) -> Vec<String> {
        let raw: Vec<String> = match self.required_tags {
            Some(ref tags) => tags.clone(),
            None => DEFAULT_REQUIRED_TAGS.iter().map(|t| t.to_string()).collect(),
        };
        let mut seen = Vec::with_capacity(raw.len());
        for tag in raw {
            let key = tag.trim().to_lowercase();
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }

    pub fn effective_audit_scope(&self) -> Vec<String> {
        match self.audit_scope {
            Some(ref scope) => scope.clone(),
            None => vec![DEFAULT_AUDIT_SCOPE.to_string()],
        }
    }

    pub fn effective_alert_settings(&self) -> AlertSettings {
        self.alert_settings.clone().unwrap_or_default()
    }

    pub fn effective_audit_ignore_tag(&self) -> &str {
        self.audit_ignore_tag
            .as_deref()
            .unwrap_or(DEFAULT_AUDIT_IGNORE_TAG)
    }

    pub fn is_collect_only(&self) -> bool {
        self.collect_only.unwrap_or(true)
    }

    pub fn requires_confirmation(&self) -> bool {
        self.confirm_shutdown.unwrap_or(true)
    }

    pub fn allows_partial_owner_match(&self) -> bool {
        self.partial_owner_match.unwrap_or(true)
    }

    pub fn effective_permanent_recipients(&self) -> &[String] {
        self.permanent_recipient.as_deref().unwrap_or(&[])
    }

    pub fn sends_email_in_collect_mode(&self) -> bool {
        self.always_send_email.unwrap_or(true)
    }

    pub fn effective_email_subject(&self) -> &str {
        self.email_subject.as_deref().unwrap_or(DEFAULT_EMAIL_SUBJECT)
    }

    pub fn effective_email_subject_fixed(&self) -> &str {
        self.email_subject_fixed
            .as_deref()
            .unwrap_or(DEFAULT_EMAIL_SUBJECT_FIXED)
    }

    pub fn effective_grace_period(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(
            self.grace_period.unwrap_or(DEFAULT_GRACE_PERIOD_HOURS),
        ))
    }

    pub fn effective_audit_log_retention_days(&self) -> u32 {
        self.audit_log_retention_days
            .unwrap_or(DEFAULT_AUDIT_LOG_RETENTION_DAYS)
    }

    // ---- Layering ----

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".reqtags").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut AuditorConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let file_config: AuditorConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Malformed {
                origin: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, file_config);
        Ok(())
    }

    /// Merge `other` into `base`; only `Some` values in `other` win.
    fn merge(base: &mut AuditorConfig, other: AuditorConfig) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(
                    if other.$field.is_some() {
                        base.$field = other.$field;
                    }
                )*
            };
        }
        take!(
            enabled,
            interval,
            required_tags,
            audit_scope,
            alert_settings,
            audit_ignore_tag,
            collect_only,
            confirm_shutdown,
            partial_owner_match,
            permanent_recipient,
            always_send_email,
            email_subject,
            email_subject_fixed,
            grace_period,
            audit_log_retention_days,
        );
    }

    /// Apply environment variable overrides.
    /// Pattern: `REQTAGS_INTERVAL`, `REQTAGS_COLLECT_ONLY`, etc. List values
    /// are comma-separated; `REQTAGS_ALERT_SETTINGS` holds JSON.
    fn apply_env_overrides(config: &mut AuditorConfig) {
        if let Some(v) = env_parse::<bool>("REQTAGS_ENABLED") {
            config.enabled = Some(v);
        }
        if let Some(v) = env_parse::<u32>("REQTAGS_INTERVAL") {
            config.interval = Some(v);
        }
        if let Some(v) = env_parse::<bool>("REQTAGS_COLLECT_ONLY") {
            config.collect_only = Some(v);
        }
        if let Some(v) = env_parse::<bool>("REQTAGS_CONFIRM_SHUTDOWN") {
            config.confirm_shutdown = Some(v);
        }
        if let Some(v) = env_parse::<u32>("REQTAGS_GRACE_PERIOD") {
            config.grace_period = Some(v);
        }
        if let Ok(val) = std::env::var("REQTAGS_REQUIRED_TAGS") {
            config.required_tags = Some(split_list(&val));
        }
        if let Ok(val) = std::env::var("REQTAGS_PERMANENT_RECIPIENT") {
            config.permanent_recipient = Some(split_list(&val));
        }
        if let Ok(val) = std::env::var("REQTAGS_ALERT_SETTINGS") {
            match AlertSettings::from_json(&val) {
                Ok(settings) => config.alert_settings = Some(settings),
                Err(e) => tracing::warn!(error = %e, "ignoring REQTAGS_ALERT_SETTINGS"),
            }
        }
    }

    /// Apply host overrides (highest priority).
    pub fn apply_overrides(config: &mut AuditorConfig, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.enabled {
            config.enabled = Some(v);
        }
        if let Some(v) = overrides.interval {
            config.interval = Some(v);
        }
        if let Some(v) = overrides.collect_only {
            config.collect_only = Some(v);
        }
        if let Some(v) = overrides.confirm_shutdown {
            config.confirm_shutdown = Some(v);
        }
        if let Some(ref v) = overrides.required_tags {
            config.required_tags = Some(v.clone());
        }
        if let Some(ref v) = overrides.permanent_recipient {
            config.permanent_recipient = Some(v.clone());
        }
        if let Some(ref v) = overrides.alert_settings {
            config.alert_settings = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Malformed {
            origin: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => Some(vec![s]),
        Some(OneOrMany::Many(v)) => Some(v),
        None => None,
    })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Structural address check; the auditor does full validation on owner tags.
fn looks_like_address(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
