//! Logging setup for Chiron services.
//!
//! Services log through `tracing`. This crate installs the subscriber, either
//! JSON for log shippers or the pretty format for a terminal, filtered with
//! `EnvFilter` directives, and names the fields procedure events carry:
//!
//! | Field | Recorded on | Meaning |
//! |-------|-------------|---------|
//! | `call_id` | `procedure.call` span, failure events | UUID v7 of the call |
//! | `path` | `procedure.call` span, failure events | Dispatch path |
//! | `procedure_type` | `procedure.call` span | `query`, `mutation` or `subscription` |
//! | `link` | failure events | Middleware that failed |
//! | `error_code` | failure events | Code of the classified error |
//! | `duration_ms` | call completion | Wall time of the call |
//!
//! ```rust,ignore
//! use chiron_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production().with_service_name("orders"))?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
