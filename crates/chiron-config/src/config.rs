//! Main configuration types.
//!
//! This module provides the top-level [`ChironConfig`] struct.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ErrorsSection, LogFormat, LoggingSection};

/// Complete Chiron configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use chiron_config::ChironConfig;
///
/// let config = ChironConfig::default();
/// assert_eq!(config.logging.level, "info");
/// assert!(!config.errors.include_cause);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ChironConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Error reporting configuration.
    #[serde(default)]
    pub errors: ErrorsSection,
}

impl ChironConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The log level does not parse as filter directives
    /// - The service name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.service_name",
                "must not be empty",
            ));
        }

        if chiron_telemetry::create_env_filter(&self.logging.level).is_err() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("invalid filter directives: {}", self.logging.level),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// This preset is optimized for local development with:
    /// - Pretty log formatting with span events
    /// - Debug log level
    /// - Error causes included in envelopes
    ///
    /// # Example
    ///
    /// ```
    /// use chiron_config::ChironConfig;
    ///
    /// let config = ChironConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.span_events = true;
        config.logging.include_location = true;

        config.errors.include_cause = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// This preset is optimized for production with:
    /// - JSON log formatting
    /// - Info log level
    /// - Error causes withheld from callers
    ///
    /// # Example
    ///
    /// ```
    /// use chiron_config::{ChironConfig, LogFormat};
    ///
    /// let config = ChironConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.span_events = false;

        config.errors.include_cause = false;

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChironConfig::default();
        assert_eq!(config.logging.service_name, "chiron-service");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.errors.include_cause);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(ChironConfig::default().validate().is_ok());
        assert!(ChironConfig::development().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_level() {
        let mut config = ChironConfig::default();
        config.logging.level = "chiron=chatty".to_string();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_validate_empty_service_name() {
        let mut config = ChironConfig::default();
        config.logging.service_name = String::new();

        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("service_name"));
    }

    #[test]
    fn test_development_preset() {
        let config = ChironConfig::development();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.span_events);
        assert!(config.errors.include_cause);
    }

    #[test]
    fn test_production_preset() {
        let config = ChironConfig::production();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.span_events);
        assert!(!config.errors.include_cause);
    }

    #[test]
    fn test_toml_serialization() {
        let config = ChironConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[logging]"));
        assert!(toml_str.contains("[errors]"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            [logging]
            service_name = "test-service"

            [errors]
            include_cause = true
        "#;

        let config: ChironConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.service_name, "test-service");
        assert_eq!(config.logging.level, "info");
        assert!(config.errors.include_cause);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let toml_str = r#"
            [server]
            http_addr = "127.0.0.1:8000"
        "#;

        let result: Result<ChironConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
