//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global service settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Attendance policy knobs (per work location)
    #[serde(default)]
    pub policy: Option<RawPolicy>,

    /// Shift template catalog
    #[serde(default)]
    pub templates: Vec<RawTemplate>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the ledger database
    pub data_dir: Option<PathBuf>,

    /// Log directory
    pub log_dir: Option<PathBuf>,
}

/// Raw attendance policy; every field falls back to a documented default
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPolicy {
    /// Symmetric check-in buffer around nominal shift start
    pub checkin_buffer_minutes: Option<u32>,

    /// Widened buffer applied to short shifts
    pub short_shift_buffer_minutes: Option<u32>,

    /// Shifts at or below this duration use the widened buffer
    pub short_shift_max_minutes: Option<u32>,

    /// How early before nominal end checkout opens
    pub early_departure_tolerance_minutes: Option<u32>,

    /// How long after nominal end checkout stays inside the window
    pub late_checkout_grace_minutes: Option<u32>,

    /// Open sessions older than this are swept by reconciliation
    pub staleness_threshold_days: Option<u32>,

    /// Reconciliation estimate when a session has no known assignment
    pub fallback_close_hours: Option<u32>,
}

/// Raw shift template definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTemplate {
    /// Unique stable ID
    pub id: String,

    /// Display name
    pub name: String,

    /// Start time of day (HH:MM format)
    pub start: String,

    /// End time of day (HH:MM format); end <= start wraps past midnight
    pub end: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_template_catalog() {
        let toml_str = r#"
            config_version = 1

            [[templates]]
            id = "day"
            name = "Day shift"
            start = "08:00"
            end = "16:00"

            [[templates]]
            id = "night"
            name = "Night shift"
            start = "22:00"
            end = "06:00"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.templates.len(), 2);
        assert_eq!(config.templates[1].id, "night");
    }

    #[test]
    fn parse_policy_overrides() {
        let toml_str = r#"
            config_version = 1

            [policy]
            checkin_buffer_minutes = 20
            late_checkout_grace_minutes = 90
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        let policy = config.policy.unwrap();
        assert_eq!(policy.checkin_buffer_minutes, Some(20));
        assert_eq!(policy.late_checkout_grace_minutes, Some(90));
        assert_eq!(policy.staleness_threshold_days, None);
    }
}
