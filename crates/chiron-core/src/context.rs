//! Per-call types.
//!
//! A [`CallOptions`] value is created by the dispatch layer for every
//! invocation of a procedure and consumed read-only by the middleware chain.

use crate::{ErrorCode, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for each call, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines of consecutive calls
/// sorted when correlated by this ID.
///
/// # Example
///
/// ```
/// use chiron_core::CallId;
///
/// let id = CallId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(Uuid);

impl CallId {
    /// Creates a new unique call ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `CallId` from an existing UUID, e.g. a propagated request ID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The operation type of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureType {
    /// Read-only operation.
    Query,
    /// Operation with side effects.
    Mutation,
    /// Long-lived operation producing a stream of values.
    Subscription,
}

impl ProcedureType {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for ProcedureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcedureType {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "mutation" => Ok(Self::Mutation),
            "subscription" => Ok(Self::Subscription),
            other => Err(RpcError::new(
                ErrorCode::MethodNotSupported,
                format!("unsupported procedure type '{other}'"),
            )),
        }
    }
}

/// Options for a single procedure invocation.
///
/// `raw_input` holds the unvalidated input exactly as the transport decoded
/// it; [`Value::Null`] means no input was sent.
///
/// # Example
///
/// ```
/// use chiron_core::{CallOptions, ProcedureType};
/// use serde_json::json;
///
/// let opts = CallOptions::new(ProcedureType::Query, "user.byId", ())
///     .with_input(json!({ "id": 7 }));
///
/// assert_eq!(opts.path, "user.byId");
/// assert_eq!(opts.raw_input["id"], 7);
/// ```
#[derive(Debug, Clone)]
pub struct CallOptions<C> {
    /// Context constructed upstream for this request.
    pub ctx: C,
    /// Raw, unvalidated input.
    pub raw_input: Value,
    /// Path the procedure was dispatched on.
    pub path: String,
    /// Operation type.
    pub kind: ProcedureType,
    /// Correlation ID for this call.
    pub call_id: CallId,
}

impl<C> CallOptions<C> {
    /// Creates call options with no input and a fresh call ID.
    #[must_use]
    pub fn new(kind: ProcedureType, path: impl Into<String>, ctx: C) -> Self {
        Self {
            ctx,
            raw_input: Value::Null,
            path: path.into(),
            kind,
            call_id: CallId::new(),
        }
    }

    /// Sets the raw input.
    #[must_use]
    pub fn with_input(mut self, raw_input: Value) -> Self {
        self.raw_input = raw_input;
        self
    }

    /// Sets the call ID, e.g. to reuse an upstream request ID.
    #[must_use]
    pub fn with_call_id(mut self, call_id: CallId) -> Self {
        self.call_id = call_id;
        self
    }
}
