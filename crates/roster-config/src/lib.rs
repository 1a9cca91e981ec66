//! Configuration parsing and validation for rosterd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Attendance policy knobs with documented defaults
//! - The shift template catalog
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let raw: RawConfig = toml::from_str(content)?;

    // Check version
    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    // Validate
    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Config::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = r#"
            config_version = 1

            [[templates]]
            id = "day"
            name = "Day shift"
            start = "08:00"
            end = "16:00"
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.catalog.len(), 1);
        assert_eq!(config.policy.checkin_buffer_minutes, 30);
    }

    #[test]
    fn reject_wrong_version() {
        let config = r#"
            config_version = 99
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_template_time() {
        let config = r#"
            config_version = 1

            [[templates]]
            id = "broken"
            name = "Broken"
            start = "26:00"
            end = "16:00"
        "#;

        let result = parse_config(config);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn policy_overrides_apply() {
        let config = r#"
            config_version = 1

            [policy]
            checkin_buffer_minutes = 20
            staleness_threshold_days = 2
        "#;

        let config = parse_config(config).unwrap();
        assert_eq!(config.policy.checkin_buffer_minutes, 20);
        assert_eq!(config.policy.staleness_threshold_days, 2);
        // Untouched knobs keep their defaults
        assert_eq!(config.policy.late_checkout_grace_minutes, 60);
    }
}
