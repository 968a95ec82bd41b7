//! Classified errors for Chiron.
//!
//! This module provides [`RpcError`], the single error type a procedure call
//! surfaces to its caller. Every failure (a rejected input, a broken output
//! contract, a failing middleware or resolver) is normalized into an
//! `RpcError` exactly once, at the point where it was captured, and then
//! travels unchanged to the caller.
//!
//! # Error codes
//!
//! | `ErrorCode` | JSON-RPC | HTTP |
//! |---|---|---|
//! | `ParseError` | -32700 | 400 |
//! | `BadRequest` | -32600 | 400 |
//! | `InternalServerError` | -32603 | 500 |
//! | `Unauthorized` | -32001 | 401 |
//! | `Forbidden` | -32003 | 403 |
//! | `NotFound` | -32004 | 404 |
//! | `MethodNotSupported` | -32005 | 405 |
//! | `Timeout` | -32008 | 408 |
//! | `Conflict` | -32009 | 409 |
//! | `PreconditionFailed` | -32012 | 412 |
//! | `PayloadTooLarge` | -32013 | 413 |
//! | `TooManyRequests` | -32029 | 429 |
//! | `ClientClosedRequest` | -32099 | 499 |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`RpcError`].
pub type RpcResult<T> = Result<T, RpcError>;

/// Machine-readable error codes.
///
/// Serialized with the `SCREAMING_SNAKE_CASE` key used on the wire
/// (`"BAD_REQUEST"`, `"INTERNAL_SERVER_ERROR"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The payload could not be parsed.
    ParseError,
    /// The input was rejected (input validation, unexpected input).
    BadRequest,
    /// The server failed, including output contract violations.
    InternalServerError,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Credentials are valid but lack permission.
    Forbidden,
    /// The target resource or procedure does not exist.
    NotFound,
    /// The procedure type is not supported for this path.
    MethodNotSupported,
    /// The call took too long.
    Timeout,
    /// Conflicting concurrent modification.
    Conflict,
    /// A precondition on the call was not met.
    PreconditionFailed,
    /// The input exceeded the accepted size.
    PayloadTooLarge,
    /// Rate limit exceeded.
    TooManyRequests,
    /// The client went away before the call settled.
    ClientClosedRequest,
}

impl ErrorCode {
    /// Returns every error code.
    #[must_use]
    pub const fn all() -> [ErrorCode; 13] {
        [
            Self::ParseError,
            Self::BadRequest,
            Self::InternalServerError,
            Self::Unauthorized,
            Self::Forbidden,
            Self::NotFound,
            Self::MethodNotSupported,
            Self::Timeout,
            Self::Conflict,
            Self::PreconditionFailed,
            Self::PayloadTooLarge,
            Self::TooManyRequests,
            Self::ClientClosedRequest,
        ]
    }

    /// Returns the wire key of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            Self::Timeout => "TIMEOUT",
            Self::Conflict => "CONFLICT",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::ClientClosedRequest => "CLIENT_CLOSED_REQUEST",
        }
    }

    /// Returns the JSON-RPC 2.0 error code.
    #[must_use]
    pub const fn json_rpc_code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::BadRequest => -32600,
            Self::InternalServerError => -32603,
            Self::Unauthorized => -32001,
            Self::Forbidden => -32003,
            Self::NotFound => -32004,
            Self::MethodNotSupported => -32005,
            Self::Timeout => -32008,
            Self::Conflict => -32009,
            Self::PreconditionFailed => -32012,
            Self::PayloadTooLarge => -32013,
            Self::TooManyRequests => -32029,
            Self::ClientClosedRequest => -32099,
        }
    }

    /// Returns the HTTP status code a transport should use for this code.
    #[must_use]
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::ParseError | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Conflict => StatusCode::CONFLICT,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            // 499 is non-standard but valid in the 100..=999 range.
            Self::ClientClosedRequest => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST)
            }
        }
    }

    /// Returns `true` when the caller, not the server, is at fault.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        !matches!(self, Self::InternalServerError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified error.
///
/// `RpcError` pairs an [`ErrorCode`] with a human-readable message and an
/// optional underlying cause. The cause is exposed through
/// [`std::error::Error::source`].
///
/// # Example
///
/// ```
/// use chiron_core::{ErrorCode, RpcError};
///
/// fn find_user(id: u64) -> Result<String, RpcError> {
///     if id == 0 {
///         return Err(RpcError::not_found("user 0 does not exist"));
///     }
///     Ok(format!("user-{id}"))
/// }
///
/// let err = find_user(0).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RpcError {
    code: ErrorCode,
    message: String,
    #[source]
    cause: Option<anyhow::Error>,
}

impl RpcError {
    /// Creates an error with an explicit message and no cause.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Creates an error whose message is taken from the cause.
    pub fn from_cause(code: ErrorCode, cause: impl Into<anyhow::Error>) -> Self {
        let cause = cause.into();
        let message = cause.to_string();
        Self {
            code,
            message: if message.is_empty() {
                code.as_str().to_string()
            } else {
                message
            },
            cause: Some(cause),
        }
    }

    /// Attaches an underlying cause, keeping the current message.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Creates an internal server error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Classifies an arbitrary error.
    ///
    /// An `RpcError` wrapped in the `anyhow::Error` is handed back as is, so
    /// an error raised with a specific code keeps it. Anything else becomes an
    /// internal server error with the original error kept as cause.
    #[must_use]
    pub fn from_unknown(err: anyhow::Error) -> Self {
        match err.downcast::<RpcError>() {
            Ok(rpc) => rpc,
            Err(other) => Self::from_cause(ErrorCode::InternalServerError, other),
        }
    }

    /// Classifies the payload of a caught panic.
    ///
    /// String payloads (the `panic!("...")` case) become the message.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "procedure panicked".to_string()
        };
        Self::internal(message)
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the underlying cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// The cause chain is only rendered when `include_cause` is set, which
    /// should be limited to development deployments.
    #[must_use]
    pub fn to_envelope(&self, path: Option<&str>, include_cause: bool) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorShape {
                message: self.message.clone(),
                code: self.code.json_rpc_code(),
                data: ErrorData {
                    code: self.code,
                    http_status: self.code.http_status().as_u16(),
                    path: path.map(ToString::to_string),
                    cause: if include_cause {
                        self.cause.as_ref().map(|c| format!("{c:#}"))
                    } else {
                        None
                    },
                },
            },
        }
    }
}

/// Serializable error envelope for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error shape.
    pub error: ErrorShape,
}

/// JSON-RPC style error shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    /// Human-readable message.
    pub message: String,
    /// JSON-RPC numeric code.
    pub code: i32,
    /// Additional structured data.
    pub data: ErrorData,
}

/// Structured data attached to an [`ErrorShape`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    /// Machine-readable code key.
    pub code: ErrorCode,
    /// HTTP status code.
    pub http_status: u16,
    /// Procedure path the error was raised on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Rendered cause chain (development only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("database unavailable")]
    struct DbDown;

    #[test]
    fn test_bad_request() {
        let error = RpcError::bad_request("missing field");
        assert_eq!(error.code(), ErrorCode::BadRequest);
        assert_eq!(error.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "missing field");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_from_cause_takes_message() {
        let error = RpcError::from_cause(ErrorCode::BadRequest, DbDown);
        assert_eq!(error.message(), "database unavailable");
        assert!(error.source().is_some());
    }

    #[test]
    fn test_from_cause_empty_message_falls_back_to_code() {
        let error = RpcError::from_cause(ErrorCode::Conflict, anyhow::anyhow!(""));
        assert_eq!(error.message(), "CONFLICT");
    }

    #[test]
    fn test_with_cause_keeps_message() {
        let error = RpcError::internal("Output validation failed").with_cause(DbDown);
        assert_eq!(error.message(), "Output validation failed");
        assert_eq!(error.cause().unwrap().to_string(), "database unavailable");
    }

    #[test]
    fn test_from_unknown_preserves_rpc_error() {
        let original = RpcError::forbidden("admins only");
        let classified = RpcError::from_unknown(anyhow::Error::new(original));
        assert_eq!(classified.code(), ErrorCode::Forbidden);
        assert_eq!(classified.message(), "admins only");
    }

    #[test]
    fn test_from_unknown_wraps_foreign_error() {
        let classified = RpcError::from_unknown(anyhow::Error::new(DbDown));
        assert_eq!(classified.code(), ErrorCode::InternalServerError);
        assert_eq!(classified.message(), "database unavailable");
        assert!(classified.cause().unwrap().is::<DbDown>());
    }

    #[test]
    fn test_from_panic_payloads() {
        let static_str = RpcError::from_panic(Box::new("boom"));
        assert_eq!(static_str.message(), "boom");

        let owned = RpcError::from_panic(Box::new(String::from("kaboom")));
        assert_eq!(owned.message(), "kaboom");

        let opaque = RpcError::from_panic(Box::new(42_u8));
        assert_eq!(opaque.code(), ErrorCode::InternalServerError);
        assert_eq!(opaque.message(), "procedure panicked");
    }

    #[test]
    fn test_envelope_hides_cause_by_default() {
        let error = RpcError::internal("Output validation failed").with_cause(DbDown);
        let envelope = error.to_envelope(Some("user.get"), false);

        let json = serde_json::to_value(&envelope).expect("serialization should work");
        assert_eq!(json["error"]["code"], -32603);
        assert_eq!(json["error"]["data"]["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(json["error"]["data"]["httpStatus"], 500);
        assert_eq!(json["error"]["data"]["path"], "user.get");
        assert!(json["error"]["data"].get("cause").is_none());
    }

    #[test]
    fn test_envelope_includes_cause_in_development() {
        let error = RpcError::internal("Output validation failed").with_cause(DbDown);
        let envelope = error.to_envelope(None, true);
        assert_eq!(envelope.error.data.cause.as_deref(), Some("database unavailable"));
        assert!(envelope.error.data.path.is_none());
    }

    #[test]
    fn test_only_internal_is_server_side() {
        for code in ErrorCode::all() {
            assert_eq!(
                code.is_client_error(),
                code != ErrorCode::InternalServerError,
                "unexpected classification for {code}"
            );
            let status = code.http_status();
            assert!(status.is_client_error() || status.is_server_error());
        }
    }

    #[test]
    fn test_code_serialization_matches_key() {
        for code in ErrorCode::all() {
            let json = serde_json::to_string(&code).expect("serialization should work");
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_client_closed_request_status() {
        assert_eq!(ErrorCode::ClientClosedRequest.http_status().as_u16(), 499);
        assert_eq!(ErrorCode::TooManyRequests.json_rpc_code(), -32029);
    }
}
