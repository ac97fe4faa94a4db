//! Configuration system for the auditor.
//! TOML-based, layered resolution: host overrides > env > project > user > defaults.

pub mod alert_settings;
pub mod auditor_config;
pub mod duration;

pub use alert_settings::{AlertSchedule, AlertSettings};
pub use auditor_config::{AuditorConfig, ConfigOverrides};
pub use duration::{parse_duration, HumanDuration};
