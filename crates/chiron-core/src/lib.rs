//! # Chiron Core
//!
//! Core types shared by every Chiron crate.
//!
//! This crate provides the vocabulary the procedure engine speaks:
//!
//! - [`RpcError`] - Classified error carrying an [`ErrorCode`] and an optional cause
//! - [`ErrorCode`] - Machine-readable error codes with JSON-RPC and HTTP mappings
//! - [`ProcedureType`] - Query, mutation or subscription
//! - [`CallOptions`] - Per-invocation context, raw input, path and type
//! - [`CallId`] - UUID v7 identifier used to correlate logs of one call

#![doc(html_root_url = "https://docs.rs/chiron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;

pub use context::{CallId, CallOptions, ProcedureType};
pub use error::{ErrorCode, ErrorData, ErrorEnvelope, ErrorShape, RpcError, RpcResult};
