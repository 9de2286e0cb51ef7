//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Check the base url is absolute
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatcherSettings → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::DispatcherSettings;

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate settings, collecting every error.
pub fn validate_settings(settings: &DispatcherSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.transports.is_empty() {
        errors.push(ValidationError::new("transports", "at least one transport is required"));
    }

    if settings.default_content_type.trim().is_empty() {
        errors.push(ValidationError::new("default_content_type", "must not be empty"));
    }

    if let Some(base_url) = &settings.base_url {
        match Url::parse(base_url) {
            Ok(url) if url.cannot_be_a_base() => {
                errors.push(ValidationError::new("base_url", "cannot be used as a base"));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::new("base_url", e.to_string())),
        }
    }

    if settings.http.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("http.connect_timeout_secs", "must be greater than 0"));
    }

    if settings.http.request_timeout_secs == Some(0) {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be greater than 0"));
    }

    if settings.http.max_response_bytes == 0 {
        errors.push(ValidationError::new("http.max_response_bytes", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        assert!(validate_settings(&DispatcherSettings::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut settings = DispatcherSettings::default();
        settings.transports.clear();
        settings.base_url = Some("not a url".to_string());
        settings.http.connect_timeout_secs = 0;
        settings.http.request_timeout_secs = Some(0);
        settings.http.max_response_bytes = 0;

        let errors = validate_settings(&settings).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "transports",
                "base_url",
                "http.connect_timeout_secs",
                "http.request_timeout_secs",
                "http.max_response_bytes"
            ]
        );
    }

    #[test]
    fn test_base_url_must_be_hierarchical() {
        let settings = DispatcherSettings {
            base_url: Some("mailto:someone@example.com".to_string()),
            ..DispatcherSettings::default()
        };
        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors[0].to_string(), "base_url: cannot be used as a base");
    }
}
