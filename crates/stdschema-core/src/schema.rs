//! # Standard Schema Contract
//!
//! [`StandardSchema`] is the capability interface every validator exposes:
//! a validation entry point returning a [`ValidationOutcome`], and an
//! optional JSON-Schema export used for documentation.
//!
//! Validation may complete synchronously or asynchronously. The entry point
//! returns a [`Validation`] either way and callers resolve it uniformly.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::outcome::ValidationOutcome;

/// Version of the standard schema contract implemented by this crate.
pub const STANDARD_VERSION: u8 = 1;

/// A boxed, sendable validation in progress.
pub type SchemaFuture = Pin<Box<dyn Future<Output = ValidationOutcome> + Send + 'static>>;

/// The value returned by [`StandardSchema::validate`].
pub enum Validation {
    /// The outcome is already known.
    Ready(ValidationOutcome),
    /// The vendor validates asynchronously.
    Pending(SchemaFuture),
}

impl Validation {
    /// Wait for the outcome, whichever way the vendor produced it.
    pub async fn resolve(self) -> ValidationOutcome {
        match self {
            Self::Ready(outcome) => outcome,
            Self::Pending(fut) => fut.await,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(outcome) => f.debug_tuple("Ready").field(outcome).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<ValidationOutcome> for Validation {
    fn from(outcome: ValidationOutcome) -> Self {
        Self::Ready(outcome)
    }
}

/// A validator implementing the standard schema contract.
pub trait StandardSchema: Send + Sync + fmt::Debug {
    /// Name of the library that produced this schema.
    fn vendor(&self) -> &str;

    /// Contract version. Always [`STANDARD_VERSION`] unless a vendor says otherwise.
    fn version(&self) -> u8 {
        STANDARD_VERSION
    }

    /// Validate `input`, producing the coerced value or the issue list.
    ///
    /// When the vendor parses rather than checks, the success value is the
    /// parsed form, and unknown fields are dropped if that is the vendor's
    /// default.
    fn validate(&self, input: Value) -> Validation;

    /// A JSON-Schema rendering of this schema, if the vendor can export one.
    fn json_schema(&self) -> Option<Value> {
        None
    }
}

/// Shared handle to a schema. Cloning shares the same allocation.
pub type SchemaRef = Arc<dyn StandardSchema>;

/// `true` when both handles point at the same schema instance.
pub fn same_schema(a: &SchemaRef, b: &SchemaRef) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

// -- Closure adapters ---------------------------------------------------------

/// A schema backed by a synchronous closure.
pub struct FnSchema<F> {
    vendor: String,
    json_schema: Option<Value>,
    check: F,
}

impl<F> FnSchema<F>
where
    F: Fn(Value) -> ValidationOutcome + Send + Sync + 'static,
{
    pub fn new(vendor: impl Into<String>, check: F) -> Self {
        Self {
            vendor: vendor.into(),
            json_schema: None,
            check,
        }
    }

    /// Attach a JSON-Schema export for documentation.
    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.json_schema = Some(schema);
        self
    }
}

impl<F> fmt::Debug for FnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSchema")
            .field("vendor", &self.vendor)
            .finish_non_exhaustive()
    }
}

impl<F> StandardSchema for FnSchema<F>
where
    F: Fn(Value) -> ValidationOutcome + Send + Sync + 'static,
{
    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn validate(&self, input: Value) -> Validation {
        Validation::Ready((self.check)(input))
    }

    fn json_schema(&self) -> Option<Value> {
        self.json_schema.clone()
    }
}

/// A schema backed by a closure returning a future.
pub struct AsyncFnSchema<F> {
    vendor: String,
    check: F,
}

impl<F, Fut> AsyncFnSchema<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ValidationOutcome> + Send + 'static,
{
    pub fn new(vendor: impl Into<String>, check: F) -> Self {
        Self {
            vendor: vendor.into(),
            check,
        }
    }
}

impl<F> fmt::Debug for AsyncFnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnSchema")
            .field("vendor", &self.vendor)
            .finish_non_exhaustive()
    }
}

impl<F, Fut> StandardSchema for AsyncFnSchema<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ValidationOutcome> + Send + 'static,
{
    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn validate(&self, input: Value) -> Validation {
        Validation::Pending(Box::pin((self.check)(input)))
    }
}

/// Wrap a synchronous closure as a [`SchemaRef`].
pub fn from_fn<F>(vendor: impl Into<String>, check: F) -> SchemaRef
where
    F: Fn(Value) -> ValidationOutcome + Send + Sync + 'static,
{
    Arc::new(FnSchema::new(vendor, check))
}

/// Wrap an async closure as a [`SchemaRef`].
pub fn from_async_fn<F, Fut>(vendor: impl Into<String>, check: F) -> SchemaRef
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ValidationOutcome> + Send + 'static,
{
    Arc::new(AsyncFnSchema::new(vendor, check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Issue;
    use serde_json::json;

    fn non_empty_string() -> SchemaRef {
        from_fn("test", |input| match input.as_str() {
            Some(s) if !s.is_empty() => ValidationOutcome::success(input),
            _ => ValidationOutcome::failure(vec![Issue::new("expected non-empty string")]),
        })
    }

    #[tokio::test]
    async fn sync_schema_resolves_ready() {
        let schema = non_empty_string();
        let validation = schema.validate(json!("hi"));
        assert!(!validation.is_pending());
        assert_eq!(validation.resolve().await, ValidationOutcome::success(json!("hi")));
    }

    #[tokio::test]
    async fn async_schema_resolves_pending() {
        let schema = from_async_fn("test-async", |input: Value| async move {
            tokio::task::yield_now().await;
            if input.is_number() {
                ValidationOutcome::success(input)
            } else {
                ValidationOutcome::failure(vec![Issue::new("expected number")])
            }
        });
        let validation = schema.validate(json!("x"));
        assert!(validation.is_pending());
        let outcome = validation.resolve().await;
        assert_eq!(outcome.issues().map(<[Issue]>::len), Some(1));
    }

    #[test]
    fn identity_comparison() {
        let a = non_empty_string();
        let b = Arc::clone(&a);
        let c = non_empty_string();
        assert!(same_schema(&a, &b));
        assert!(!same_schema(&a, &c));
    }

    #[test]
    fn contract_metadata() {
        let schema = FnSchema::new("acme", ValidationOutcome::success)
            .with_json_schema(json!({"type": "string"}));
        assert_eq!(schema.vendor(), "acme");
        assert_eq!(schema.version(), STANDARD_VERSION);
        assert_eq!(schema.json_schema(), Some(json!({"type": "string"})));
    }
}
