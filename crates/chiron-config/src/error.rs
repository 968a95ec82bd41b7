//! Errors raised while assembling a [`ChironConfig`](crate::ChironConfig).

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was pointed at a path that does not exist.
    #[error("no configuration file at {}", path.display())]
    Missing {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("could not read {}", path.display())]
    Unreadable {
        /// The file being read.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The content is not valid TOML, or does not match the schema.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// The content is not valid JSON, or does not match the schema.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Neither TOML nor JSON.
    #[error("`{0}` is not a supported configuration format, expected toml or json")]
    UnsupportedFormat(String),

    /// A `.env` file was found but could not be loaded.
    #[error("could not load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A loaded value breaks a configuration rule.
    #[error("`{field}` is invalid: {reason}")]
    InvalidValue {
        /// Dotted path of the field, e.g. `logging.level`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable carried a value its field cannot take.
    #[error("{var} could not be applied: {reason}")]
    InvalidEnvVar {
        /// The variable name, prefix included.
        var: String,
        /// What the field expects.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an [`InvalidValue`](Self::InvalidValue) error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_names_the_path() {
        let err = ConfigError::Missing {
            path: PathBuf::from("/etc/chiron/orders.toml"),
        };
        assert_eq!(err.to_string(), "no configuration file at /etc/chiron/orders.toml");
    }

    #[test]
    fn test_invalid_value_names_the_field() {
        let err = ConfigError::invalid_value("logging.service_name", "must not be empty");
        assert_eq!(err.to_string(), "`logging.service_name` is invalid: must not be empty");
    }

    #[test]
    fn test_unsupported_format() {
        let err = ConfigError::UnsupportedFormat("yaml".to_string());
        assert!(err.to_string().starts_with("`yaml` is not a supported"));
    }

    #[test]
    fn test_unreadable_keeps_io_source() {
        use std::error::Error as _;

        let err = ConfigError::Unreadable {
            path: PathBuf::from("chiron.toml"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.source().is_some());
    }
}
