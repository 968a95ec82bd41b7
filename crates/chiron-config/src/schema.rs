//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use chiron_core::{ErrorEnvelope, RpcError};
use chiron_telemetry::LogConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format `{other}`, expected json or pretty")),
        }
    }
}

/// Logging configuration section.
///
/// # Example
///
/// ```
/// use chiron_config::{LogFormat, LoggingSection};
///
/// let section = LoggingSection {
///     level: "chiron_procedure=debug,info".to_string(),
///     format: LogFormat::Pretty,
///     ..Default::default()
/// };
/// let log = section.to_log_config();
/// assert!(!log.json_format);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Service name attached to the startup log line.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Log span open and close events (shows call durations).
    #[serde(default)]
    pub span_events: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts the section into the settings `chiron_telemetry` starts from.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: self.span_events,
            file_line_info: self.include_location,
            thread_ids: false,
            include_target: true,
            service_name: self.service_name.clone(),
        }
    }
}

impl From<&LoggingSection> for LogConfig {
    fn from(section: &LoggingSection) -> Self {
        section.to_log_config()
    }
}

/// Error reporting section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ErrorsSection {
    /// Include the underlying cause in error envelopes sent to callers.
    ///
    /// Causes can leak implementation details; keep this off in production.
    #[serde(default)]
    pub include_cause: bool,
}

impl ErrorsSection {
    /// Renders an error as the envelope sent back to a caller.
    #[must_use]
    pub fn envelope(&self, error: &RpcError, path: Option<&str>) -> ErrorEnvelope {
        error.to_envelope(path, self.include_cause)
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "chiron-service".to_string()
}
