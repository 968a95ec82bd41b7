//! Safe invocation of user-supplied code.
//!
//! Middleware and resolvers are arbitrary async code. [`invoke_safe`] runs
//! one of them and hands back every way it can fail, an `Err` or a panic,
//! as a [`Caught`] value, so the chain executor only ever branches on data.

use chiron_core::RpcError;
use futures_util::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

/// A failure captured from user code, not yet classified.
pub enum Caught {
    /// The code returned an error.
    Error(anyhow::Error),
    /// The code panicked, either while building its future or while polled.
    Panic(Box<dyn Any + Send>),
}

impl Caught {
    /// Classifies the failure into an [`RpcError`].
    ///
    /// An error that already is an `RpcError` keeps its code and message.
    #[must_use]
    pub fn classify(self) -> RpcError {
        match self {
            Self::Error(err) => RpcError::from_unknown(err),
            Self::Panic(payload) => RpcError::from_panic(payload),
        }
    }

    /// Turns the failure into a cause for an error classified by the caller.
    ///
    /// A panic becomes an error carrying the panic message.
    #[must_use]
    pub fn into_cause(self) -> anyhow::Error {
        match self {
            Self::Error(err) => err,
            Self::Panic(payload) => {
                anyhow::anyhow!(RpcError::from_panic(payload).message().to_owned())
            }
        }
    }
}

impl fmt::Debug for Caught {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => f.debug_tuple("Error").field(err).finish(),
            Self::Panic(_) => f.write_str("Panic(..)"),
        }
    }
}

/// Runs `f` and awaits its future, capturing errors and panics.
///
/// # Example
///
/// ```
/// use chiron_procedure::invoke::{invoke_safe, Caught};
///
/// # tokio_test::block_on(async {
/// let ok = invoke_safe(|| async { Ok::<_, anyhow::Error>(2) }).await;
/// assert_eq!(ok.unwrap(), 2);
///
/// let failed = invoke_safe(|| async { Err::<u8, _>(anyhow::anyhow!("nope")) }).await;
/// assert!(matches!(failed, Err(Caught::Error(_))));
/// # });
/// ```
pub async fn invoke_safe<F, Fut, T>(f: F) -> Result<T, Caught>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let fut = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(fut) => fut,
        Err(payload) => return Err(Caught::Panic(payload)),
    };

    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Caught::Error(err)),
        Err(payload) => Err(Caught::Panic(payload)),
    }
}
