//! Procedure construction.
//!
//! ```
//! use chiron_procedure::{procedure, ValidatorKind, ValidatorSource};
//!
//! let greet = procedure::<()>()
//!     .input(ValidatorSource::from_fn(|raw| {
//!         serde_json::from_value::<String>(raw).map_err(Into::into)
//!     }))
//!     .resolve(|args| async move { Ok(format!("hello {}", args.input)) })
//!     .unwrap();
//!
//! assert_eq!(greet.input_kind(), ValidatorKind::Callable);
//! assert_eq!(greet.middleware_count(), 0);
//! ```

use crate::error::BuildError;
use crate::procedure::{Definition, Procedure, ResolverArgs, TypedResolver};
use crate::validator::{Validator, ValidatorRole, ValidatorSource};
use chiron_core::RpcError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Message of the error raised when input is sent to a procedure that
/// declares none.
pub const NO_INPUT_EXPECTED: &str = "No input expected";

/// Builder for [`Procedure`].
///
/// Validators are resolved as soon as they are declared; the first failure
/// is reported by [`resolve`](Self::resolve), so an unusable procedure is
/// never produced.
pub struct ProcedureBuilder<C, M = (), I = ()> {
    input: Result<Validator<I>, BuildError>,
    output: Result<Validator<Value>, BuildError>,
    options: M,
    _ctx: PhantomData<fn(C)>,
}

/// Starts building a procedure for context type `C`.
#[must_use]
pub fn procedure<C>() -> ProcedureBuilder<C> {
    ProcedureBuilder::new()
}

impl<C> ProcedureBuilder<C> {
    /// Creates a builder that accepts no input and passes output through.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: Ok(no_input()),
            output: Ok(Validator::identity()),
            options: (),
            _ctx: PhantomData,
        }
    }
}

impl<C> Default for ProcedureBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Procedure<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// Starts building a procedure.
    #[must_use]
    pub fn builder() -> ProcedureBuilder<C> {
        ProcedureBuilder::new()
    }
}

impl<C, M, I> ProcedureBuilder<C, M, I> {
    /// Declares the input validator.
    #[must_use]
    pub fn input<I2>(self, source: ValidatorSource<I2>) -> ProcedureBuilder<C, M, I2>
    where
        I2: Send + 'static,
    {
        ProcedureBuilder {
            input: Validator::resolve(source, ValidatorRole::Input),
            output: self.output,
            options: self.options,
            _ctx: PhantomData,
        }
    }

    /// Declares the output validator.
    ///
    /// Whatever type the validator produces is serialised back to JSON.
    #[must_use]
    pub fn output<O>(self, source: ValidatorSource<O>) -> Self
    where
        O: Serialize + Send + 'static,
    {
        Self {
            output: Validator::resolve(source, ValidatorRole::Output).map(Validator::into_json),
            ..self
        }
    }

    /// Sets the static options handed to every middleware and the resolver.
    #[must_use]
    pub fn options<M2>(self, options: M2) -> ProcedureBuilder<C, M2, I> {
        ProcedureBuilder {
            input: self.input,
            output: self.output,
            options,
            _ctx: PhantomData,
        }
    }
}

impl<C, M, I> ProcedureBuilder<C, M, I>
where
    C: Clone + Send + Sync + 'static,
    M: Send + Sync + 'static,
    I: Send + 'static,
{
    /// Sets the resolver and builds the procedure.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnrecognizedValidator`] when a declared schema
    /// exposes no supported validator convention.
    pub fn resolve<F, Fut, R>(self, resolver: F) -> Result<Procedure<C, M>, BuildError>
    where
        F: Fn(ResolverArgs<C, I, M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize + 'static,
    {
        let input = self.input?;
        let output = self.output?;
        debug!(
            input_kind = ?input.kind(),
            output_kind = ?output.kind(),
            "procedure built"
        );

        Ok(Procedure::from_definition(Definition {
            input_kind: input.kind(),
            resolver: Box::new(TypedResolver::new(input, resolver)),
            output,
            options: Arc::new(self.options),
        }))
    }
}

impl<C, M: fmt::Debug, I> fmt::Debug for ProcedureBuilder<C, M, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureBuilder")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn no_input() -> Validator<()> {
    Validator::from_fn(|raw: Value| {
        if raw.is_null() {
            Ok(())
        } else {
            Err(RpcError::bad_request(NO_INPUT_EXPECTED).into())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{Schema, ValidatorKind};
    use chiron_core::{CallOptions, ErrorCode, ProcedureType};
    use serde_json::json;

    struct Opaque;

    impl Schema<String> for Opaque {}

    fn query(input: Value) -> CallOptions<()> {
        CallOptions::new(ProcedureType::Query, "test.builder", ()).with_input(input)
    }

    #[tokio::test]
    async fn test_default_input_rejects_values() {
        let proc = procedure::<()>()
            .resolve(|_args| async move { Ok(true) })
            .unwrap();

        assert_eq!(proc.call(query(Value::Null)).await.unwrap(), json!(true));

        let err = proc.call(query(json!({ "id": 1 }))).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
        assert_eq!(err.message(), NO_INPUT_EXPECTED);
    }

    #[tokio::test]
    async fn test_default_output_is_identity() {
        let proc = procedure::<()>()
            .resolve(|_args| async move { Ok(json!({ "nested": [1, null] })) })
            .unwrap();

        assert_eq!(proc.output_kind(), ValidatorKind::Callable);
        assert_eq!(
            proc.call(query(Value::Null)).await.unwrap(),
            json!({ "nested": [1, null] })
        );
    }

    #[test]
    fn test_unrecognized_input_schema_fails_build() {
        let err = procedure::<()>()
            .input(ValidatorSource::<String>::schema(Opaque))
            .resolve(|args| async move { Ok(args.input) })
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnrecognizedValidator {
                role: ValidatorRole::Input
            }
        ));
    }

    #[test]
    fn test_unrecognized_output_schema_fails_build() {
        let err = procedure::<()>()
            .output(ValidatorSource::<String>::schema(Opaque))
            .resolve(|_args| async move { Ok("x") })
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnrecognizedValidator {
                role: ValidatorRole::Output
            }
        ));
    }

    #[test]
    fn test_builder_starts_with_no_middleware() {
        let proc = Procedure::<u8>::builder()
            .options("meta")
            .resolve(|args| async move { Ok(*args.options) })
            .unwrap();
        assert_eq!(proc.middleware_count(), 0);
        assert_eq!(*proc.options(), "meta");
    }
}
