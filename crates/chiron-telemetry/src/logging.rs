//! Subscriber setup and the field names procedure events are logged with.
//!
//! [`init_logging`] installs one formatting layer, JSON or pretty, behind an
//! [`EnvFilter`]. The procedure engine opens a `procedure.call` span per call
//! and records [`fields::CALL_ID`], [`fields::PATH`] and
//! [`fields::PROCEDURE_TYPE`] on it, so with JSON output every event raised
//! inside a middleware or a resolver can be traced back to its call.
//!
//! ```rust,ignore
//! use chiron_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development().with_service_name("orders"))?;
//! tracing::info!(path = "order.create", "procedure registered");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// How a service logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// When false, [`init_logging`] installs nothing.
    pub enabled: bool,
    /// `EnvFilter` directives, e.g. `"info,chiron_procedure=debug"`.
    pub level: String,
    /// One JSON object per event instead of the multi-line pretty format.
    pub json_format: bool,
    /// Also log span creation and closing, which shows call durations.
    pub span_events: bool,
    /// Source file and line of each event.
    pub file_line_info: bool,
    /// Id of the thread that emitted each event.
    pub thread_ids: bool,
    /// Module path of each event.
    pub include_target: bool,
    /// Reported once, on the first line logged.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Readable output at `debug`, with spans and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            ..Self::production()
        }
    }

    /// JSON output at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            service_name: "chiron".to_string(),
        }
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Checks the settings without installing anything.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a blank service name or unparsable directives.
    pub fn validate(&self) -> TelemetryResult<()> {
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::InvalidConfig(
                "service name must not be empty".to_string(),
            ));
        }
        EnvFilter::try_new(&self.level).map_err(|err| {
            TelemetryError::InvalidConfig(format!("invalid directives `{}`: {err}", self.level))
        })?;
        Ok(())
    }

    fn fmt_span(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// `LoggingInit` when the directives do not parse or another global
/// subscriber is already in place.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let base = tracing_subscriber::fmt::layer()
        .with_span_events(config.fmt_span())
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json_format {
        base.json()
            .with_current_span(true)
            .with_span_list(false)
            .with_filter(filter)
            .boxed()
    } else {
        base.pretty().with_filter(filter).boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|err| TelemetryError::LoggingInit(err.to_string()))?;

    tracing::info!(
        { fields::SERVICE_NAME } = %config.service_name,
        json = config.json_format,
        "logging initialized"
    );
    Ok(())
}

/// Parses filter directives.
///
/// # Errors
///
/// `LoggingInit` naming the directive that failed to parse.
pub fn create_env_filter(directives: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|err| TelemetryError::LoggingInit(format!("invalid directives `{directives}`: {err}")))
}

/// Field names shared by every event the procedure engine emits.
pub mod fields {
    /// UUID v7 of the call.
    pub const CALL_ID: &str = "call_id";
    /// Path the procedure was dispatched on.
    pub const PATH: &str = "path";
    /// `query`, `mutation` or `subscription`.
    pub const PROCEDURE_TYPE: &str = "procedure_type";
    /// Code of a classified error.
    pub const ERROR_CODE: &str = "error_code";
    /// Wall time of a call, in milliseconds.
    pub const DURATION_MS: &str = "duration_ms";
    /// Name of the middleware link that failed.
    pub const LINK: &str = "link";
    /// Service name, on the startup line.
    pub const SERVICE_NAME: &str = "service.name";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let prod = LogConfig::default();
        assert_eq!(prod, LogConfig::production());
        assert!(prod.json_format);
        assert!(!prod.span_events);
        assert_eq!(prod.level, "info");

        let dev = LogConfig::development();
        assert!(!dev.json_format);
        assert!(dev.span_events);
        assert!(dev.file_line_info);
        assert_eq!(dev.level, "debug");
        assert_eq!(dev.service_name, prod.service_name);
    }

    #[test]
    fn test_span_events_follow_flag() {
        assert_eq!(LogConfig::production().fmt_span(), FmtSpan::NONE);
        assert_eq!(
            LogConfig::development().fmt_span(),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("warn,chiron_procedure=debug").is_ok());

        let err = create_env_filter("chiron_procedure=loud").unwrap_err();
        assert!(err.to_string().contains("chiron_procedure=loud"));
    }

    #[test]
    fn test_validate() {
        assert!(LogConfig::production().validate().is_ok());

        let blank = LogConfig::production().with_service_name("  ");
        assert!(matches!(blank.validate(), Err(TelemetryError::InvalidConfig(_))));

        let noisy = LogConfig {
            level: "chiron=loud".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(noisy.validate(), Err(TelemetryError::InvalidConfig(_))));
    }

    #[test]
    fn test_disabled_installs_nothing() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::production().with_service_name("telemetry-test");
        init_logging(&config).unwrap();

        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, TelemetryError::LoggingInit(_)));
    }
}
