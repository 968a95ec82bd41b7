//! Per-call middleware chain executor.
//!
//! A [`Chain`] is built for every call from the procedure's middleware list
//! plus its resolver link. Links run in order; each one is handed a [`Next`]
//! bound to the following index. Whatever a link returns, errs or panics
//! with is turned into a [`MiddlewareResult`] right there, so a failure never
//! skips past the link that produced it.

use crate::invoke::invoke_safe;
use crate::middleware::{BoxFuture, MiddlewareArgs, MiddlewareResult, Next, SharedMiddleware};
use chiron_core::{CallId, CallOptions, ProcedureType, RpcError};
use chiron_telemetry::fields;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

pub(crate) struct Chain<C, M> {
    links: Vec<SharedMiddleware<C, M>>,
    ctx: C,
    raw_input: Arc<Value>,
    path: Arc<str>,
    kind: ProcedureType,
    call_id: CallId,
    options: Arc<M>,
}

impl<C, M> Chain<C, M>
where
    C: Clone + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    pub(crate) fn new(
        links: Vec<SharedMiddleware<C, M>>,
        opts: CallOptions<C>,
        options: Arc<M>,
    ) -> Arc<Self> {
        Arc::new(Self {
            links,
            ctx: opts.ctx,
            raw_input: Arc::new(opts.raw_input),
            path: Arc::from(opts.path),
            kind: opts.kind,
            call_id: opts.call_id,
            options,
        })
    }

    pub(crate) const fn original_ctx(&self) -> &C {
        &self.ctx
    }

    /// Runs the whole chain with the call's original context.
    pub(crate) fn run(self: Arc<Self>) -> BoxFuture<'static, MiddlewareResult<C>> {
        Next::new(self, 0).run()
    }

    /// Runs the link at `index` and everything it forwards to.
    pub(crate) fn invoke(
        chain: Arc<Self>,
        index: usize,
        ctx: C,
    ) -> BoxFuture<'static, MiddlewareResult<C>> {
        Box::pin(async move {
            let Some(link) = chain.links.get(index).cloned() else {
                error!(
                    { fields::CALL_ID } = %chain.call_id,
                    { fields::PATH } = %chain.path,
                    index,
                    links = chain.links.len(),
                    "middleware chain ended without a result"
                );
                return MiddlewareResult::Err(RpcError::internal(
                    "No result from middlewares - did you forget to `return next()`?",
                ));
            };

            let args = MiddlewareArgs {
                ctx,
                kind: chain.kind,
                path: Arc::clone(&chain.path),
                raw_input: Arc::clone(&chain.raw_input),
                options: Arc::clone(&chain.options),
                next: Next::new(Arc::clone(&chain), index + 1),
            };

            match invoke_safe(|| link.handle(args)).await {
                Ok(result) => result,
                Err(caught) => {
                    let err = caught.classify();
                    if err.code().is_client_error() {
                        warn!(
                            { fields::CALL_ID } = %chain.call_id,
                            { fields::PATH } = %chain.path,
                            { fields::LINK } = link.name(),
                            index,
                            { fields::ERROR_CODE } = err.code().as_str(),
                            error = %err,
                            "middleware failed"
                        );
                    } else {
                        error!(
                            { fields::CALL_ID } = %chain.call_id,
                            { fields::PATH } = %chain.path,
                            { fields::LINK } = link.name(),
                            index,
                            { fields::ERROR_CODE } = err.code().as_str(),
                            error = %err,
                            "middleware failed"
                        );
                    }
                    MiddlewareResult::Err(err)
                }
            }
        })
    }
}
