//! Layered loading of [`ChironConfig`].
//!
//! A service typically starts from a preset, reads the file checked in next
//! to it and lets the deployment flip individual switches through the
//! environment. Each step replaces or patches what the previous one built.

use std::env;
use std::fs;
use std::io;
use std::path::Path;

use crate::{ChironConfig, ConfigError};

/// Builds a [`ChironConfig`] step by step.
///
/// Steps, in the order they take effect:
/// 1. a starting point: `new()` defaults, `with_development()` or
///    `with_production()`
/// 2. a document, `with_file` / `with_optional_file` / `with_string`, which
///    replaces the whole configuration (omitted fields fall back to their
///    defaults, not to the preset)
/// 3. environment overrides named `PREFIX__SECTION__FIELD`, applied by
///    [`load`](Self::load) when a prefix was set
///
/// # Example
///
/// ```no_run
/// use chiron_config::ConfigLoader;
///
/// # fn main() -> Result<(), chiron_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("orders.toml")?
///     .with_env_prefix("ORDERS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: ChironConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = ChironConfig::default();
        self
    }

    /// Resets to [`ChironConfig::development`].
    ///
    /// ```
    /// use chiron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert!(config.errors.include_cause);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ChironConfig::development();
        self
    }

    /// Resets to [`ChironConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ChironConfig::production();
        self
    }

    /// Replaces the configuration with the content of a `.toml` or `.json`
    /// file.
    ///
    /// # Errors
    ///
    /// `Missing` when the file does not exist, `Unreadable` on other I/O
    /// failures, `UnsupportedFormat` for other extensions, and `Toml` or
    /// `Json` when the content is malformed or names unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::Missing {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.config = parse_document(&content, format)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file leaves the
    /// configuration as it is.
    ///
    /// # Errors
    ///
    /// Same as `with_file` for a file that exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the configuration with an inline document.
    ///
    /// `format` is `"toml"` or `"json"`, in any case.
    ///
    /// ```
    /// use chiron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[logging]\nservice_name = \"orders\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.logging.service_name, "orders");
    /// ```
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` for any other format, `Toml` or `Json` when the
    /// content does not parse.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse_document(content, format)?;
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// With prefix `orders`, `ORDERS__LOGGING__LEVEL=debug` sets
    /// `logging.level` and `ORDERS__ERRORS__INCLUDE_CAUSE=1` turns on
    /// `errors.include_cause`. Variables naming no known field are ignored.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_ascii_uppercase());
        self
    }

    /// Loads the nearest `.env` file into the process environment, so that
    /// its variables take part in the overrides.
    ///
    /// # Errors
    ///
    /// `Dotenv` when a file was found but could not be parsed. No file at all
    /// is fine.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// `InvalidEnvVar` when an override cannot be applied, `InvalidValue`
    /// when the final configuration is rejected by
    /// [`ChironConfig::validate`].
    pub fn load(mut self) -> Result<ChironConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_overrides(&prefix, env::vars())?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration as built so far, skipping environment
    /// overrides and validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ChironConfig {
        self.config
    }

    fn apply_overrides<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let scope = format!("{prefix}__");
        for (var, value) in vars {
            let Some(setting) = var.strip_prefix(&scope).and_then(Setting::lookup) else {
                continue;
            };
            setting
                .apply(&mut self.config, &value)
                .map_err(|reason| ConfigError::InvalidEnvVar {
                    var: var.clone(),
                    reason,
                })?;
        }
        Ok(())
    }
}

fn parse_document(content: &str, format: &str) -> Result<ChironConfig, ConfigError> {
    if format.eq_ignore_ascii_case("toml") {
        Ok(toml::from_str(content)?)
    } else if format.eq_ignore_ascii_case("json") {
        Ok(serde_json::from_str(content)?)
    } else {
        Err(ConfigError::UnsupportedFormat(format.to_string()))
    }
}

/// A field that can be set from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Setting {
    ServiceName,
    LoggingEnabled,
    Level,
    Format,
    SpanEvents,
    IncludeLocation,
    IncludeCause,
}

impl Setting {
    const NAMES: [(&'static str, Self); 7] = [
        ("LOGGING__SERVICE_NAME", Self::ServiceName),
        ("LOGGING__ENABLED", Self::LoggingEnabled),
        ("LOGGING__LEVEL", Self::Level),
        ("LOGGING__FORMAT", Self::Format),
        ("LOGGING__SPAN_EVENTS", Self::SpanEvents),
        ("LOGGING__INCLUDE_LOCATION", Self::IncludeLocation),
        ("ERRORS__INCLUDE_CAUSE", Self::IncludeCause),
    ];

    fn lookup(path: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(path))
            .map(|(_, setting)| *setting)
    }

    fn apply(self, config: &mut ChironConfig, value: &str) -> Result<(), String> {
        let logging = &mut config.logging;
        match self {
            Self::ServiceName => logging.service_name = value.to_string(),
            Self::LoggingEnabled => logging.enabled = flag(value)?,
            Self::Level => logging.level = value.to_string(),
            Self::Format => logging.format = value.parse()?,
            Self::SpanEvents => logging.span_events = flag(value)?,
            Self::IncludeLocation => logging.include_location = flag(value)?,
            Self::IncludeCause => config.errors.include_cause = flag(value)?,
        }
        Ok(())
    }
}

fn flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got `{other}`")),
    }
}
