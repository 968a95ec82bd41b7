//! # Chiron Procedure
//!
//! Procedure execution engine for the Chiron framework.
//!
//! A procedure is one named operation: an input validator, a resolver, an
//! output validator and an ordered list of middleware. Every call runs the
//! middleware in order with the resolver appended as the last link.
//!
//! ## Call Flow
//!
//! ```text
//! call(opts) → m1 → m2 → … → resolver link
//!                              ├─ parse input   (failure → BAD_REQUEST)
//!                              ├─ resolver
//!                              └─ parse output  (failure → INTERNAL_SERVER_ERROR)
//! ```
//!
//! Any link may answer without calling `next`, in which case nothing after
//! it runs. Errors and panics are classified where they happen and reach
//! the caller unchanged.
//!
//! ## Key Features
//!
//! - **Validator Adapter**: functions or schema objects with any of four
//!   conventions, resolved once at build time
//! - **Safe Invocation**: errors and panics in user code become data
//! - **Context Override**: `next.run_with(ctx)` changes the context for
//!   everything downstream
//! - **Inheritance**: `inherit_middlewares` derives a procedure with extra
//!   middleware in front
//!
//! ## Example
//!
//! ```
//! use chiron_core::{CallOptions, ErrorCode, ProcedureType};
//! use chiron_procedure::{middleware_fn, procedure, MiddlewareArgs, ValidatorSource};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let double = procedure::<u32>()
//!     .input(ValidatorSource::from_fn(|raw| {
//!         raw.as_i64().ok_or_else(|| anyhow::anyhow!("expected a number"))
//!     }))
//!     .resolve(|args| async move { Ok(args.input * 2) })
//!     .unwrap();
//!
//! let logged = double.inherit_middlewares([middleware_fn(
//!     "log",
//!     |args: MiddlewareArgs<u32>| async move {
//!         tracing::info!(path = %args.path, "calling");
//!         Ok(args.next.run().await)
//!     },
//! )]);
//!
//! let call = |input| CallOptions::new(ProcedureType::Query, "math.double", 1).with_input(input);
//! assert_eq!(logged.call(call(json!(5))).await.unwrap(), json!(10));
//! assert_eq!(
//!     logged.call(call(json!("a"))).await.unwrap_err().code(),
//!     ErrorCode::BadRequest
//! );
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/chiron-procedure/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod chain;
pub mod error;
pub mod invoke;
pub mod middleware;
mod procedure;
pub mod validator;

// Re-export main types at crate root
pub use builder::{procedure, ProcedureBuilder, NO_INPUT_EXPECTED};
pub use error::BuildError;
pub use middleware::{
    middleware_fn, BoxFuture, FnMiddleware, Middleware, MiddlewareArgs, MiddlewareResult, Next,
    SharedMiddleware,
};
pub use procedure::{Procedure, ResolverArgs, OUTPUT_VALIDATION_FAILED};
pub use validator::{
    AsyncParser, Factory, ParseFn, Parser, Schema, SyncValidator, Validator, ValidatorKind,
    ValidatorRole, ValidatorSource,
};
