//! Configuration validation

use crate::schema::{RawConfig, RawTemplate};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Template '{template_id}': {message}")]
    TemplateError {
        template_id: String,
        message: String,
    },

    #[error("Duplicate template ID: {0}")]
    DuplicateTemplateId(String),

    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Policy error: {0}")]
    PolicyError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Check for duplicate template IDs
    let mut seen_ids = HashSet::new();
    for template in &config.templates {
        if !seen_ids.insert(&template.id) {
            errors.push(ValidationError::DuplicateTemplateId(template.id.clone()));
        }
    }

    for template in &config.templates {
        errors.extend(validate_template(template));
    }

    if let Some(policy) = &config.policy {
        if policy.staleness_threshold_days == Some(0) {
            errors.push(ValidationError::PolicyError(
                "staleness_threshold_days must be at least 1".into(),
            ));
        }
        if policy.fallback_close_hours == Some(0) {
            errors.push(ValidationError::PolicyError(
                "fallback_close_hours must be at least 1".into(),
            ));
        }
    }

    errors
}

fn validate_template(template: &RawTemplate) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if template.id.is_empty() {
        errors.push(ValidationError::TemplateError {
            template_id: template.id.clone(),
            message: "id cannot be empty".into(),
        });
    }

    if template.name.is_empty() {
        errors.push(ValidationError::TemplateError {
            template_id: template.id.clone(),
            message: "name cannot be empty".into(),
        });
    }

    if let Err(e) = parse_time(&template.start) {
        errors.push(ValidationError::InvalidTimeFormat {
            value: template.start.clone(),
            message: e,
        });
    }

    if let Err(e) = parse_time(&template.end) {
        errors.push(ValidationError::InvalidTimeFormat {
            value: template.end.clone(),
            message: e,
        });
    }

    errors
}

/// Parse HH:MM time format
pub fn parse_time(s: &str) -> Result<(u8, u8), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected HH:MM format".into());
    }

    let hour: u8 = parts[0]
        .parse()
        .map_err(|_| "Invalid hour".to_string())?;
    let minute: u8 = parts[1]
        .parse()
        .map_err(|_| "Invalid minute".to_string())?;

    if hour >= 24 {
        return Err("Hour must be 0-23".into());
    }
    if minute >= 60 {
        return Err("Minute must be 0-59".into());
    }

    Ok((hour, minute))
}
