//! Validator adapter.
//!
//! Procedures accept validators in several calling conventions: a plain
//! function (sync or async), or a schema object exposing an async parse, a
//! sync parse, a sync validate or a create method. This module resolves any
//! of them, once, into a single [`Validator`] whose [`parse`](Validator::parse)
//! is called per request without looking at the original shape again.
//!
//! # Resolution order
//!
//! | Order | Convention | [`ValidatorKind`] |
//! |---|---|---|
//! | 1 | Function ([`ValidatorSource::from_fn`], [`ValidatorSource::from_async_fn`]) | `Callable` |
//! | 2 | [`Schema::into_async_parser`] | `AsyncParse` |
//! | 3 | [`Schema::into_parser`] | `SyncParse` |
//! | 4 | [`Schema::into_sync_validator`] | `SyncValidate` |
//! | 5 | [`Schema::into_factory`] | `Create` |
//!
//! A schema exposing none of them is rejected with
//! [`BuildError::UnrecognizedValidator`] when the procedure is built.
//!
//! # Example
//!
//! ```
//! use chiron_procedure::validator::{Parser, Schema, Validator, ValidatorKind, ValidatorRole, ValidatorSource};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct PositiveInt;
//!
//! impl Parser<u64> for PositiveInt {
//!     fn parse(&self, raw: Value) -> anyhow::Result<u64> {
//!         raw.as_u64()
//!             .filter(|n| *n > 0)
//!             .ok_or_else(|| anyhow::anyhow!("expected a positive integer"))
//!     }
//! }
//!
//! impl Schema<u64> for PositiveInt {
//!     fn into_parser(self: Arc<Self>) -> Option<Arc<dyn Parser<u64>>> {
//!         Some(self)
//!     }
//! }
//!
//! let validator: Validator<u64> = Validator::resolve(ValidatorSource::schema(PositiveInt), ValidatorRole::Input).unwrap();
//! assert_eq!(validator.kind(), ValidatorKind::SyncParse);
//! ```

use crate::error::BuildError;
use crate::middleware::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The normalized parse function every validator is resolved into.
pub type ParseFn<T> = Arc<dyn Fn(Value) -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;

/// Which calling convention a validator was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorKind {
    /// A plain function.
    Callable,
    /// A schema with an asynchronous parse method.
    AsyncParse,
    /// A schema with a synchronous parse method.
    SyncParse,
    /// A schema with a synchronous validate method.
    SyncValidate,
    /// A schema with a create method.
    Create,
}

/// Which side of the resolver a validator guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorRole {
    /// Validates the raw input before the resolver runs.
    Input,
    /// Validates the resolver's output.
    Output,
}

impl fmt::Display for ValidatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Schema exposing an asynchronous parse method.
pub trait AsyncParser<T>: Send + Sync {
    /// Parses the raw value.
    fn parse_async(&self, raw: Value) -> BoxFuture<'_, anyhow::Result<T>>;
}

/// Schema exposing a synchronous parse method.
pub trait Parser<T>: Send + Sync {
    /// Parses the raw value.
    fn parse(&self, raw: Value) -> anyhow::Result<T>;
}

/// Schema exposing a synchronous validate method.
pub trait SyncValidator<T>: Send + Sync {
    /// Validates the raw value and returns the validated form.
    fn validate_sync(&self, raw: Value) -> anyhow::Result<T>;
}

/// Schema exposing a create method that builds the value from raw data.
pub trait Factory<T>: Send + Sync {
    /// Creates the value from raw data, failing when it does not conform.
    fn create(&self, raw: Value) -> anyhow::Result<T>;
}

/// A validator object probed for the conventions it supports.
///
/// Every probe defaults to `None`. Implement the ones the schema supports by
/// returning `Some(self)`.
pub trait Schema<T>: Send + Sync + 'static {
    /// Returns the async parse capability, if any.
    fn into_async_parser(self: Arc<Self>) -> Option<Arc<dyn AsyncParser<T>>> {
        None
    }

    /// Returns the sync parse capability, if any.
    fn into_parser(self: Arc<Self>) -> Option<Arc<dyn Parser<T>>> {
        None
    }

    /// Returns the sync validate capability, if any.
    fn into_sync_validator(self: Arc<Self>) -> Option<Arc<dyn SyncValidator<T>>> {
        None
    }

    /// Returns the create capability, if any.
    fn into_factory(self: Arc<Self>) -> Option<Arc<dyn Factory<T>>> {
        None
    }
}

/// A validator as handed to the procedure builder, before resolution.
pub enum ValidatorSource<T> {
    /// A plain function, already normalized.
    Callable(ParseFn<T>),
    /// A schema object to be probed.
    Schema(Arc<dyn Schema<T>>),
}

impl<T: Send + 'static> ValidatorSource<T> {
    /// Wraps a synchronous validation function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(move |raw| -> BoxFuture<'static, anyhow::Result<T>> {
            let parsed = f(raw);
            Box::pin(async move { parsed })
        }))
    }

    /// Wraps an asynchronous validation function.
    pub fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self::Callable(Arc::new(move |raw| -> BoxFuture<'static, anyhow::Result<T>> {
            Box::pin(f(raw))
        }))
    }

    /// Wraps a schema object.
    pub fn schema<S: Schema<T>>(schema: S) -> Self {
        Self::Schema(Arc::new(schema))
    }
}

impl<T> fmt::Debug for ValidatorSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("ValidatorSource::Callable"),
            Self::Schema(_) => f.write_str("ValidatorSource::Schema"),
        }
    }
}

/// A resolved validator.
pub struct Validator<T> {
    kind: ValidatorKind,
    parse: ParseFn<T>,
}

impl<T: Send + 'static> Validator<T> {
    /// Resolves a validator source into its normalized parse function.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnrecognizedValidator`] when a schema exposes
    /// none of the supported conventions.
    pub fn resolve(source: ValidatorSource<T>, role: ValidatorRole) -> Result<Self, BuildError> {
        let schema = match source {
            ValidatorSource::Callable(parse) => {
                return Ok(Self {
                    kind: ValidatorKind::Callable,
                    parse,
                })
            }
            ValidatorSource::Schema(schema) => schema,
        };

        if let Some(parser) = Arc::clone(&schema).into_async_parser() {
            return Ok(Self {
                kind: ValidatorKind::AsyncParse,
                parse: Arc::new(move |raw| -> BoxFuture<'static, anyhow::Result<T>> {
                    let parser = Arc::clone(&parser);
                    Box::pin(async move { parser.parse_async(raw).await })
                }),
            });
        }

        if let Some(parser) = Arc::clone(&schema).into_parser() {
            return Ok(Self::from_sync(ValidatorKind::SyncParse, move |raw| {
                parser.parse(raw)
            }));
        }

        if let Some(validator) = Arc::clone(&schema).into_sync_validator() {
            return Ok(Self::from_sync(ValidatorKind::SyncValidate, move |raw| {
                validator.validate_sync(raw)
            }));
        }

        if let Some(factory) = schema.into_factory() {
            return Ok(Self::from_sync(ValidatorKind::Create, move |raw| {
                factory.create(raw)
            }));
        }

        Err(BuildError::UnrecognizedValidator { role })
    }

    pub(crate) fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::from_sync(ValidatorKind::Callable, f)
    }

    fn from_sync<F>(kind: ValidatorKind, f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            kind,
            parse: Arc::new(move |raw| -> BoxFuture<'static, anyhow::Result<T>> {
                let parsed = f(raw);
                Box::pin(async move { parsed })
            }),
        }
    }

    /// Returns the convention this validator was resolved from.
    #[must_use]
    pub const fn kind(&self) -> ValidatorKind {
        self.kind
    }

    /// Parses a raw value.
    pub fn parse(&self, raw: Value) -> BoxFuture<'static, anyhow::Result<T>> {
        (self.parse)(raw)
    }
}

impl<T: Serialize + Send + 'static> Validator<T> {
    /// Converts the parsed value back to JSON after validation.
    ///
    /// Used for output validators: the chain carries JSON data, whatever
    /// type the validator produces.
    #[must_use]
    pub fn into_json(self) -> Validator<Value> {
        let parse = self.parse;
        Validator {
            kind: self.kind,
            parse: Arc::new(move |raw| -> BoxFuture<'static, anyhow::Result<Value>> {
                let parsed = parse(raw);
                Box::pin(async move { Ok(serde_json::to_value(parsed.await?)?) })
            }),
        }
    }
}

impl Validator<Value> {
    /// A validator that passes the value through unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self::from_sync(ValidatorKind::Callable, Ok)
    }
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            parse: Arc::clone(&self.parse),
        }
    }
}

impl<T> fmt::Debug for Validator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("kind", &self.kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Exposes every convention and counts which one was used.
    #[derive(Default)]
    struct Everything {
        async_calls: AtomicUsize,
        sync_calls: AtomicUsize,
    }

    impl AsyncParser<String> for Everything {
        fn parse_async(&self, raw: Value) -> BoxFuture<'_, anyhow::Result<String>> {
            self.async_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(format!("async:{raw}")) })
        }
    }

    impl Parser<String> for Everything {
        fn parse(&self, raw: Value) -> anyhow::Result<String> {
            self.sync_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("sync:{raw}"))
        }
    }

    impl Schema<String> for Everything {
        fn into_async_parser(self: Arc<Self>) -> Option<Arc<dyn AsyncParser<String>>> {
            Some(self)
        }

        fn into_parser(self: Arc<Self>) -> Option<Arc<dyn Parser<String>>> {
            Some(self)
        }
    }

    struct YupLike;

    impl SyncValidator<i64> for YupLike {
        fn validate_sync(&self, raw: Value) -> anyhow::Result<i64> {
            raw.as_i64().ok_or_else(|| anyhow::anyhow!("not an integer"))
        }
    }

    impl Factory<i64> for YupLike {
        fn create(&self, _raw: Value) -> anyhow::Result<i64> {
            Ok(-1)
        }
    }

    impl Schema<i64> for YupLike {
        fn into_sync_validator(self: Arc<Self>) -> Option<Arc<dyn SyncValidator<i64>>> {
            Some(self)
        }

        fn into_factory(self: Arc<Self>) -> Option<Arc<dyn Factory<i64>>> {
            Some(self)
        }
    }

    struct StructLike;

    impl Factory<bool> for StructLike {
        fn create(&self, raw: Value) -> anyhow::Result<bool> {
            raw.as_bool().ok_or_else(|| anyhow::anyhow!("not a boolean"))
        }
    }

    impl Schema<bool> for StructLike {
        fn into_factory(self: Arc<Self>) -> Option<Arc<dyn Factory<bool>>> {
            Some(self)
        }
    }

    struct Opaque;

    impl Schema<u8> for Opaque {}

    #[tokio::test]
    async fn test_callable_is_used_as_is() {
        let source = ValidatorSource::from_fn(|raw: Value| {
            raw.as_str()
                .map(str::to_uppercase)
                .ok_or_else(|| anyhow::anyhow!("expected a string"))
        });
        let validator = Validator::resolve(source, ValidatorRole::Input).unwrap();

        assert_eq!(validator.kind(), ValidatorKind::Callable);
        assert_eq!(validator.parse(json!("abc")).await.unwrap(), "ABC");
        assert!(validator.parse(json!(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_async_callable() {
        let source = ValidatorSource::<u64>::from_async_fn(|raw: Value| async move {
            tokio::task::yield_now().await;
            Ok(raw.as_u64().unwrap_or_default() + 1)
        });
        let validator = Validator::resolve(source, ValidatorRole::Input).unwrap();
        assert_eq!(validator.parse(json!(41)).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_async_parse_wins_over_sync_parse() {
        let schema = Arc::new(Everything::default());
        let validator = Validator::resolve(
            ValidatorSource::Schema(Arc::clone(&schema) as Arc<dyn Schema<String>>),
            ValidatorRole::Input,
        )
        .unwrap();

        assert_eq!(validator.kind(), ValidatorKind::AsyncParse);
        assert_eq!(validator.parse(json!(1)).await.unwrap(), "async:1");
        assert_eq!(schema.async_calls.load(Ordering::SeqCst), 1);
        assert_eq!(schema.sync_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validate_sync_wins_over_create() {
        let validator =
            Validator::<i64>::resolve(ValidatorSource::schema(YupLike), ValidatorRole::Input)
                .unwrap();

        assert_eq!(validator.kind(), ValidatorKind::SyncValidate);
        assert_eq!(validator.parse(json!(7)).await.unwrap(), 7);
        assert!(validator.parse(json!("7")).await.is_err());
    }

    #[tokio::test]
    async fn test_create_is_last_resort() {
        let validator =
            Validator::<bool>::resolve(ValidatorSource::schema(StructLike), ValidatorRole::Output)
                .unwrap();

        assert_eq!(validator.kind(), ValidatorKind::Create);
        assert!(validator.parse(json!(true)).await.unwrap());
    }

    #[test]
    fn test_unrecognized_schema_is_rejected() {
        let err = Validator::<u8>::resolve(ValidatorSource::schema(Opaque), ValidatorRole::Output)
            .unwrap_err();

        assert!(matches!(
            err,
            BuildError::UnrecognizedValidator {
                role: ValidatorRole::Output
            }
        ));
        assert!(err.to_string().contains("output"));
    }

    #[tokio::test]
    async fn test_identity_passes_value_through() {
        let validator = Validator::identity();
        let value = json!({ "nested": [1, 2, 3] });
        assert_eq!(validator.parse(value.clone()).await.unwrap(), value);
    }

    #[tokio::test]
    async fn test_into_json_serializes_parsed_value() {
        let validator =
            Validator::<i64>::resolve(ValidatorSource::schema(YupLike), ValidatorRole::Output)
                .unwrap()
                .into_json();

        assert_eq!(validator.kind(), ValidatorKind::SyncValidate);
        assert_eq!(validator.parse(json!(3)).await.unwrap(), json!(3));
        assert!(validator.parse(json!(null)).await.is_err());
    }
}
