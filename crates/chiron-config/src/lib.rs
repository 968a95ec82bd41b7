//! Configuration for services built on Chiron.
//!
//! A [`ChironConfig`] has two sections:
//!
//! - [`LoggingSection`]: filter directives, output format and span events,
//!   turned into a [`chiron_telemetry::LogConfig`] at startup
//! - [`ErrorsSection`]: whether the envelopes sent back to callers expose
//!   the underlying cause of an error
//!
//! Unknown sections and fields are rejected, so a typo in a file fails the
//! load instead of being silently ignored.
//!
//! # Example
//!
//! ```no_run
//! use chiron_config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("orders.toml")?
//!     .with_env_prefix("ORDERS")
//!     .load()?;
//!
//! chiron_telemetry::init_logging(&config.logging.to_log_config())?;
//! # Ok(())
//! # }
//! ```
//!
//! A complete file:
//!
//! ```toml
//! [logging]
//! service_name = "orders"
//! enabled = true
//! level = "info,chiron_procedure=debug"
//! format = "json"
//! span_events = false
//! include_location = false
//!
//! [errors]
//! include_cause = false
//! ```
//!
//! Each field can be overridden with a `PREFIX__SECTION__FIELD` variable,
//! e.g. `ORDERS__LOGGING__LEVEL=debug` or `ORDERS__ERRORS__INCLUDE_CAUSE=1`.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
