//! Settings loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::DispatcherSettings;
use crate::config::validation::{validate_settings, ValidationError};

/// Error type for settings loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(content: &str) -> Result<DispatcherSettings, ConfigError> {
    let settings: DispatcherSettings = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_settings(&settings).map_err(ConfigError::Validation)?;
    Ok(settings)
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<DispatcherSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_settings(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TransportKind;

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ajax-dispatch-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "transports = [\"modern\"]\n[http]\nuse_system_proxy = false\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.transports, vec![TransportKind::Modern]);
        assert!(!settings.http.use_system_proxy);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = load_settings(Path::new("/nonexistent/ajax-dispatch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_settings("transports = [\"carrier-pigeon\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_errors_joined() {
        let err = parse_settings("transports = []\ndefault_content_type = \"\"").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: transports: at least one transport is required, default_content_type: must not be empty"
        );
    }
}
