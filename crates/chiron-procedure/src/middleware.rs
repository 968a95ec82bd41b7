//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait every link of a procedure's
//! chain implements. A middleware receives the call's context, metadata and
//! raw input together with a [`Next`] continuation, and either forwards to
//! the rest of the chain or answers on its own.
//!
//! # Example
//!
//! ```
//! use chiron_procedure::{middleware_fn, MiddlewareArgs, MiddlewareResult};
//! use chiron_core::RpcError;
//!
//! #[derive(Clone)]
//! struct Ctx {
//!     user: Option<String>,
//! }
//!
//! let is_authed = middleware_fn("is_authed", |args: MiddlewareArgs<Ctx>| async move {
//!     if args.ctx.user.is_none() {
//!         return Ok(MiddlewareResult::err(RpcError::unauthorized("sign in first")));
//!     }
//!     Ok(args.next.run().await)
//! });
//! assert_eq!(is_authed.name(), "is_authed");
//! ```

use crate::chain::Chain;
use chiron_core::{ProcedureType, RpcError};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware that can be stored in a procedure.
pub type SharedMiddleware<C, M = ()> = Arc<dyn Middleware<C, M>>;

/// The value threaded through every link of the chain.
///
/// Once a link produces `Err`, no link after it runs and this very error is
/// what the caller of [`Procedure::call`](crate::Procedure::call) receives.
#[derive(Debug)]
pub enum MiddlewareResult<C> {
    /// The chain produced data.
    Ok {
        /// Output data.
        data: Value,
        /// Context the data was produced under.
        ctx: C,
    },
    /// The chain failed.
    Err(RpcError),
}

impl<C> MiddlewareResult<C> {
    /// Creates a successful result.
    #[must_use]
    pub fn ok(data: Value, ctx: C) -> Self {
        Self::Ok { data, ctx }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn err(error: RpcError) -> Self {
        Self::Err(error)
    }

    /// Returns `true` for a successful result.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Drops the context and returns the data or the error.
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self {
            Self::Ok { data, .. } => Ok(data),
            Self::Err(error) => Err(error),
        }
    }
}

/// Everything a middleware receives for one call.
pub struct MiddlewareArgs<C, M = ()> {
    /// Context chosen by the previous link, or the call's original context.
    pub ctx: C,
    /// Operation type of the call.
    pub kind: ProcedureType,
    /// Path the procedure was dispatched on.
    pub path: Arc<str>,
    /// Raw, unvalidated input.
    pub raw_input: Arc<Value>,
    /// Static options of the procedure.
    pub options: Arc<M>,
    /// Continuation to the rest of the chain.
    pub next: Next<C, M>,
}

/// The core middleware trait.
///
/// # Invariants
///
/// - A middleware either runs `next` (at most once, enforced by [`Next`]
///   being consumed) or returns its own result without running it.
/// - Returning `Err` is the same as throwing: the error is classified at
///   this link and the rest of the chain never runs.
pub trait Middleware<C, M = ()>: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str;

    /// Processes one call.
    fn handle<'a>(
        &'a self,
        args: MiddlewareArgs<C, M>,
    ) -> BoxFuture<'a, anyhow::Result<MiddlewareResult<C>>>;
}

/// Continuation to the next link of the chain.
///
/// Running it consumes it, so a middleware cannot call the rest of the
/// chain twice.
pub struct Next<C, M = ()> {
    chain: Arc<Chain<C, M>>,
    index: usize,
}

impl<C, M> Next<C, M>
where
    C: Clone + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    pub(crate) fn new(chain: Arc<Chain<C, M>>, index: usize) -> Self {
        Self { chain, index }
    }

    /// Runs the rest of the chain with the call's original context.
    pub fn run(self) -> BoxFuture<'static, MiddlewareResult<C>> {
        let ctx = self.chain.original_ctx().clone();
        self.run_with(ctx)
    }

    /// Runs the rest of the chain with a substituted context.
    ///
    /// Every later middleware, the resolver and the output validation see
    /// `ctx` instead of the original context.
    pub fn run_with(self, ctx: C) -> BoxFuture<'static, MiddlewareResult<C>> {
        Chain::invoke(self.chain, self.index, ctx)
    }
}

/// A middleware that can be created from an async function.
///
/// # Example
///
/// ```
/// use chiron_procedure::{FnMiddleware, MiddlewareArgs, SharedMiddleware};
/// use std::sync::Arc;
///
/// let timing = FnMiddleware::new("timing", |args: MiddlewareArgs<()>| async move {
///     let started = std::time::Instant::now();
///     let result = args.next.run().await;
///     tracing::debug!(elapsed = ?started.elapsed(), "downstream finished");
///     Ok(result)
/// });
/// let shared: SharedMiddleware<()> = Arc::new(timing);
/// assert_eq!(shared.name(), "timing");
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<C, M, F, Fut> Middleware<C, M> for FnMiddleware<F>
where
    C: Send + 'static,
    M: 'static,
    F: Fn(MiddlewareArgs<C, M>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<MiddlewareResult<C>>> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        args: MiddlewareArgs<C, M>,
    ) -> BoxFuture<'a, anyhow::Result<MiddlewareResult<C>>> {
        Box::pin((self.func)(args))
    }
}

/// Creates a shared middleware from an async function.
pub fn middleware_fn<C, M, F, Fut>(name: &'static str, func: F) -> SharedMiddleware<C, M>
where
    C: Send + 'static,
    M: 'static,
    F: Fn(MiddlewareArgs<C, M>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<MiddlewareResult<C>>> + Send + 'static,
{
    Arc::new(FnMiddleware::new(name, func))
}
