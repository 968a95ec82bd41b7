//! Telemetry error types.

use thiserror::Error;

/// Why logging could not be set up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The subscriber could not be installed.
    #[error("logging could not be initialized: {0}")]
    LoggingInit(String),

    /// A [`LogConfig`](crate::LogConfig) setting is unusable.
    #[error("invalid logging configuration: {0}")]
    InvalidConfig(String),
}
