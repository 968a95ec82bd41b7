//! Executable procedures.
//!
//! A [`Procedure`] bundles an input validator, a resolver, an output
//! validator, static options and an ordered middleware list. It is built
//! once (see [`ProcedureBuilder`](crate::ProcedureBuilder)) and then called
//! any number of times, concurrently if needed.

use crate::chain::Chain;
use crate::invoke::invoke_safe;
use crate::middleware::{BoxFuture, Middleware, MiddlewareArgs, MiddlewareResult, SharedMiddleware};
use crate::validator::{Validator, ValidatorKind};
use chiron_core::{CallOptions, ErrorCode, ProcedureType, RpcError};
use chiron_telemetry::fields;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, debug_span, Instrument};

/// Message of the error raised when a resolver's output breaks its contract.
pub const OUTPUT_VALIDATION_FAILED: &str = "Output validation failed";

/// What a resolver receives.
pub struct ResolverArgs<C, I, M = ()> {
    /// Context forwarded by the last middleware.
    pub ctx: C,
    /// Input parsed by the input validator.
    pub input: I,
    /// Raw input as sent by the caller.
    pub raw_input: Arc<Value>,
    /// Operation type of the call.
    pub kind: ProcedureType,
    /// Path the procedure was dispatched on.
    pub path: Arc<str>,
    /// Static options of the procedure.
    pub options: Arc<M>,
}

/// One resolver invocation, before the input is parsed.
pub(crate) struct ResolverCall<C, M> {
    pub(crate) ctx: C,
    pub(crate) raw_input: Arc<Value>,
    pub(crate) kind: ProcedureType,
    pub(crate) path: Arc<str>,
    pub(crate) options: Arc<M>,
}

/// Input parsing, the user resolver and output serialisation, behind one
/// object-safe interface.
pub(crate) trait Resolve<C, M>: Send + Sync + 'static {
    fn resolve(&self, call: ResolverCall<C, M>) -> BoxFuture<'static, anyhow::Result<Value>>;
}

pub(crate) struct TypedResolver<I, F, R> {
    input: Validator<I>,
    func: Arc<F>,
    _output: PhantomData<fn() -> R>,
}

impl<I, F, R> TypedResolver<I, F, R> {
    pub(crate) fn new(input: Validator<I>, func: F) -> Self {
        Self {
            input,
            func: Arc::new(func),
            _output: PhantomData,
        }
    }
}

impl<C, M, I, F, Fut, R> Resolve<C, M> for TypedResolver<I, F, R>
where
    C: Send + 'static,
    M: Send + Sync + 'static,
    I: Send + 'static,
    F: Fn(ResolverArgs<C, I, M>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: Serialize + 'static,
{
    fn resolve(&self, call: ResolverCall<C, M>) -> BoxFuture<'static, anyhow::Result<Value>> {
        let validator = self.input.clone();
        let func = Arc::clone(&self.func);
        Box::pin(async move {
            let raw = Value::clone(&call.raw_input);
            let input = invoke_safe(|| validator.parse(raw))
                .await
                .map_err(|caught| RpcError::from_cause(ErrorCode::BadRequest, caught.into_cause()))?;
            let output = func(ResolverArgs {
                ctx: call.ctx,
                input,
                raw_input: call.raw_input,
                kind: call.kind,
                path: call.path,
                options: call.options,
            })
            .await?;
            let raw_output = serde_json::to_value(output)
                .map_err(|cause| RpcError::internal(OUTPUT_VALIDATION_FAILED).with_cause(cause))?;
            Ok(raw_output)
        })
    }
}

/// Everything a procedure's calls share.
pub(crate) struct Definition<C, M> {
    pub(crate) resolver: Box<dyn Resolve<C, M>>,
    pub(crate) input_kind: ValidatorKind,
    pub(crate) output: Validator<Value>,
    pub(crate) options: Arc<M>,
}

/// The resolver wrapped as the terminal link of the chain.
struct ResolverLink<C, M> {
    def: Arc<Definition<C, M>>,
}

impl<C, M> Middleware<C, M> for ResolverLink<C, M>
where
    C: Clone + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "resolver"
    }

    fn handle<'a>(
        &'a self,
        args: MiddlewareArgs<C, M>,
    ) -> BoxFuture<'a, anyhow::Result<MiddlewareResult<C>>> {
        let MiddlewareArgs {
            ctx,
            kind,
            path,
            raw_input,
            options,
            next: _,
        } = args;

        let resolved = self.def.resolver.resolve(ResolverCall {
            ctx: ctx.clone(),
            raw_input,
            kind,
            path,
            options,
        });
        let output = self.def.output.clone();

        Box::pin(async move {
            let raw_output = resolved.await?;
            let data = invoke_safe(|| output.parse(raw_output))
                .await
                .map_err(|caught| {
                    RpcError::internal(OUTPUT_VALIDATION_FAILED).with_cause(caught.into_cause())
                })?;
            Ok(MiddlewareResult::ok(data, ctx))
        })
    }
}

/// An executable procedure.
///
/// Cloning is cheap: the validators, the resolver and the options are
/// shared, only the middleware list is copied.
///
/// # Example
///
/// ```
/// use chiron_core::{CallOptions, ProcedureType};
/// use chiron_procedure::{Procedure, ValidatorSource};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let double = Procedure::<()>::builder()
///     .input(ValidatorSource::from_fn(|raw| {
///         raw.as_i64().ok_or_else(|| anyhow::anyhow!("expected a number"))
///     }))
///     .resolve(|args| async move { Ok(args.input * 2) })
///     .unwrap();
///
/// let opts = CallOptions::new(ProcedureType::Query, "math.double", ()).with_input(json!(5));
/// assert_eq!(double.call(opts).await.unwrap(), json!(10));
/// # });
/// ```
pub struct Procedure<C, M = ()> {
    def: Arc<Definition<C, M>>,
    middlewares: Vec<SharedMiddleware<C, M>>,
}

impl<C, M> Procedure<C, M>
where
    C: Clone + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    pub(crate) fn from_definition(def: Definition<C, M>) -> Self {
        Self {
            def: Arc::new(def),
            middlewares: Vec::new(),
        }
    }

    /// Runs the middleware chain and the resolver for one call.
    ///
    /// # Errors
    ///
    /// Returns the error classified by the link that failed, unchanged.
    pub async fn call(&self, opts: CallOptions<C>) -> Result<Value, RpcError> {
        let span = debug_span!(
            "procedure.call",
            { fields::CALL_ID } = %opts.call_id,
            { fields::PATH } = %opts.path,
            { fields::PROCEDURE_TYPE } = %opts.kind,
        );

        let mut links: Vec<SharedMiddleware<C, M>> =
            Vec::with_capacity(self.middlewares.len() + 1);
        links.extend(self.middlewares.iter().cloned());
        links.push(Arc::new(ResolverLink {
            def: Arc::clone(&self.def),
        }));
        let chain = Chain::new(links, opts, Arc::clone(&self.def.options));

        async move {
            let started = Instant::now();
            let result = chain.run().await.into_result();
            debug!(
                { fields::DURATION_MS } = started.elapsed().as_secs_f64() * 1000.0,
                ok = result.is_ok(),
                "procedure call finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Calls the procedure and deserialises its output.
    ///
    /// # Errors
    ///
    /// Returns the call's error, or `INTERNAL_SERVER_ERROR` when the output
    /// does not deserialise into `T`.
    pub async fn call_as<T: DeserializeOwned>(&self, opts: CallOptions<C>) -> Result<T, RpcError> {
        let data = self.call(opts).await?;
        serde_json::from_value(data)
            .map_err(|cause| RpcError::from_cause(ErrorCode::InternalServerError, cause))
    }

    /// Returns a new procedure running `middlewares` before the existing
    /// ones.
    ///
    /// The receiver is left unchanged; both procedures share their resolver,
    /// validators and options.
    #[must_use]
    pub fn inherit_middlewares<I>(&self, middlewares: I) -> Self
    where
        I: IntoIterator<Item = SharedMiddleware<C, M>>,
    {
        let mut combined: Vec<SharedMiddleware<C, M>> = middlewares.into_iter().collect();
        combined.extend(self.middlewares.iter().cloned());
        Self {
            def: Arc::clone(&self.def),
            middlewares: combined,
        }
    }

    /// Returns the number of middleware that run before the resolver.
    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns the names of the middleware in execution order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the static options.
    #[must_use]
    pub fn options(&self) -> &M {
        &self.def.options
    }

    /// Returns the convention the input validator was resolved from.
    #[must_use]
    pub fn input_kind(&self) -> ValidatorKind {
        self.def.input_kind
    }

    /// Returns the convention the output validator was resolved from.
    #[must_use]
    pub fn output_kind(&self) -> ValidatorKind {
        self.def.output.kind()
    }
}

impl<C, M> Clone for Procedure<C, M> {
    fn clone(&self) -> Self {
        Self {
            def: Arc::clone(&self.def),
            middlewares: self.middlewares.clone(),
        }
    }
}

impl<C: 'static, M: 'static> fmt::Debug for Procedure<C, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("middlewares", &self.middlewares.iter().map(|mw| mw.name()).collect::<Vec<_>>())
            .field("input_kind", &self.def.input_kind)
            .field("output_kind", &self.def.output.kind())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::middleware_fn;
    use crate::validator::ValidatorSource;
    use serde_json::json;
    use std::sync::Mutex;

    fn query(input: Value) -> CallOptions<()> {
        CallOptions::new(ProcedureType::Query, "test.proc", ()).with_input(input)
    }

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> SharedMiddleware<()> {
        let log = Arc::clone(log);
        middleware_fn(name, move |args: MiddlewareArgs<()>| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(name);
                Ok(args.next.run().await)
            }
        })
    }

    #[tokio::test]
    async fn test_resolver_receives_call_metadata() {
        let proc = Procedure::<()>::builder()
            .resolve(|args| async move {
                assert!(args.raw_input.is_null());
                Ok(json!({ "path": &*args.path, "kind": args.kind }))
            })
            .unwrap();

        let out = proc.call(query(Value::Null)).await.unwrap();
        assert_eq!(out, json!({ "path": "test.proc", "kind": "query" }));
    }

    #[tokio::test]
    async fn test_inherit_prepends_and_leaves_receiver_alone() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let base = Procedure::<()>::builder()
            .resolve(|_args| async move { Ok("done") })
            .unwrap()
            .inherit_middlewares([recorder(&log, "m3")]);
        let derived = base.inherit_middlewares([recorder(&log, "m1"), recorder(&log, "m2")]);

        assert_eq!(base.middleware_names(), vec!["m3"]);
        assert_eq!(derived.middleware_names(), vec!["m1", "m2", "m3"]);
        assert_eq!(derived.input_kind(), base.input_kind());

        derived.call(query(Value::Null)).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_call_as_deserialises_output() {
        let proc = Procedure::<()>::builder()
            .resolve(|_args| async move { Ok(vec![1_u8, 2, 3]) })
            .unwrap();

        let out: Vec<u8> = proc.call_as(query(Value::Null)).await.unwrap();
        assert_eq!(out, vec![1, 2, 3]);

        let err = proc.call_as::<String>(query(Value::Null)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalServerError);
    }

    #[tokio::test]
    async fn test_unserialisable_output_is_a_server_error() {
        let proc = Procedure::<()>::builder()
            .resolve(|_args| async move {
                let mut map = std::collections::HashMap::new();
                map.insert((1, 2), "tuple keys are not JSON");
                Ok(map)
            })
            .unwrap();

        let err = proc.call(query(Value::Null)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalServerError);
        assert_eq!(err.message(), OUTPUT_VALIDATION_FAILED);
        assert!(err.cause().is_some());
    }

    #[tokio::test]
    async fn test_options_reach_middleware_and_resolver() {
        #[derive(Debug, PartialEq)]
        struct Meta {
            role: &'static str,
        }

        let guard = middleware_fn("guard", |args: MiddlewareArgs<(), Meta>| async move {
            if args.options.role != "admin" {
                return Ok(MiddlewareResult::err(RpcError::forbidden("admins only")));
            }
            Ok(args.next.run().await)
        });
        let proc = Procedure::<()>::builder()
            .options(Meta { role: "admin" })
            .resolve(|args| async move { Ok(args.options.role) })
            .unwrap()
            .inherit_middlewares([guard]);

        assert_eq!(proc.options(), &Meta { role: "admin" });
        assert_eq!(proc.call(query(Value::Null)).await.unwrap(), json!("admin"));
    }

    #[test]
    fn test_debug_lists_middleware() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let proc = Procedure::<()>::builder()
            .resolve(|_args| async move { Ok(()) })
            .unwrap()
            .inherit_middlewares([recorder(&log, "auth"), recorder(&log, "audit")]);

        let debug = format!("{proc:?}");
        assert!(debug.starts_with("Procedure"));
        assert!(debug.contains(r#"middlewares: ["auth", "audit"]"#));
        assert!(debug.contains("input_kind"));
    }

    #[tokio::test]
    async fn test_clone_shares_definition() {
        let proc = Procedure::<()>::builder()
            .output(ValidatorSource::from_fn(|raw: Value| {
                raw.as_str()
                    .map(str::to_uppercase)
                    .ok_or_else(|| anyhow::anyhow!("expected a string"))
            }))
            .resolve(|_args| async move { Ok("shout") })
            .unwrap();
        let copy = proc.clone();

        assert_eq!(copy.output_kind(), ValidatorKind::Callable);
        assert_eq!(copy.call(query(Value::Null)).await.unwrap(), json!("SHOUT"));
    }
}
