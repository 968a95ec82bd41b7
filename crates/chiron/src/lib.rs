//! # Chiron
//!
//! **Type-safe procedure engine with middleware chains and validation**
//!
//! Chiron runs named procedures for an RPC layer:
//!
//! - **Validation at the edges** – Input is parsed before the resolver runs,
//!   output is checked after it returns
//! - **Ordered middleware** – Each link may forward, substitute the context
//!   or answer on its own
//! - **Classified errors** – Every failure carries a code that maps to a
//!   JSON-RPC code and an HTTP status
//! - **Structured logging** – Calls run in a span carrying their ID and path
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chiron::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("CHIRON").load()?;
//!     init_logging(&config.logging.to_log_config())?;
//!
//!     let user_by_id = procedure::<AppContext>()
//!         .input(ValidatorSource::from_fn(|raw| Ok(serde_json::from_value::<u64>(raw)?)))
//!         .resolve(|args| async move { load_user(&args.ctx.db, args.input).await })?
//!         .inherit_middlewares([is_authed()]);
//!
//!     let opts = CallOptions::new(ProcedureType::Query, "user.byId", ctx).with_input(raw);
//!     match user_by_id.call(opts).await {
//!         Ok(user) => respond(user),
//!         Err(err) => respond(config.errors.envelope(&err, Some("user.byId"))),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! call → middleware 1 → … → middleware n → parse input → resolver → parse output
//!          │                    │              │                        │
//!          └──── answer or fail early ─────────┴─ BAD_REQUEST           └─ INTERNAL_SERVER_ERROR
//! ```

#![doc(html_root_url = "https://docs.rs/chiron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use chiron_core as core;

// Re-export procedure engine
pub use chiron_procedure as procedure;

// Re-export logging setup
pub use chiron_telemetry as telemetry;

// Re-export configuration
pub use chiron_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use chiron::prelude::*;
///
/// let proc = procedure::<()>()
///     .resolve(|_args| async move { Ok("pong") })
///     .unwrap();
/// assert_eq!(proc.middleware_count(), 0);
/// ```
pub mod prelude {
    pub use chiron_core::{CallId, CallOptions, ErrorCode, ProcedureType, RpcError, RpcResult};

    pub use chiron_procedure::{
        middleware_fn, procedure, BuildError, Middleware, MiddlewareArgs, MiddlewareResult, Next,
        Procedure, ProcedureBuilder, ResolverArgs, Schema, SharedMiddleware, ValidatorSource,
    };

    pub use chiron_telemetry::{init_logging, LogConfig};

    pub use chiron_config::{ChironConfig, ConfigLoader};
}
