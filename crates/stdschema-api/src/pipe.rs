//! # Validation Pipe
//!
//! Runs inbound handler arguments through a [`StandardSchema`] and turns the
//! outcome into either the (possibly transformed) value or an
//! [`HttpException`].
//!
//! A pipe is either **bound** to one schema at construction, or
//! **type-driven**: it resolves the schema from the argument's [`Metatype`]
//! through the [`MetadataRegistry`]. The mode never changes afterwards.
//!
//! ## Resolution order (type-driven)
//!
//! 1. Custom-kind arguments are skipped unless
//!    [`PipeOptions::validate_custom_decorators`] is set.
//! 2. The metatype is [`PipeOptions::expected_type`] if set, else the
//!    argument's own.
//! 3. Absent or primitive metatypes are skipped.
//! 4. The static schema (registered DTO) wins over the attached schema.
//! 5. No schema found: skip.
//!
//! Skipped arguments pass through unchanged.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;
use stdschema_core::{Issue, MetadataRegistry, Metatype, SchemaRef, StandardSchema};

use crate::error::{HttpException, VALIDATION_FAILED};

/// What a custom exception factory produced.
#[derive(Debug, Clone)]
pub enum FactoryOutput {
    /// Raised as-is.
    Exception(HttpException),
    /// Wrapped in a 400 Bad Request.
    Payload(Value),
}

impl From<HttpException> for FactoryOutput {
    fn from(exception: HttpException) -> Self {
        Self::Exception(exception)
    }
}

impl From<Value> for FactoryOutput {
    fn from(payload: Value) -> Self {
        Self::Payload(payload)
    }
}

/// Maps validation issues to the error raised by the pipe.
pub type ExceptionFactory = Arc<dyn Fn(&[Issue]) -> FactoryOutput + Send + Sync>;

/// Pipe configuration. Immutable once the pipe is built.
#[derive(Clone)]
pub struct PipeOptions {
    /// Status used by the default structured error. Default 400.
    pub error_http_status_code: StatusCode,
    pub exception_factory: Option<ExceptionFactory>,
    /// Validate arguments of kind [`ParamKind::Custom`]. Default false.
    pub validate_custom_decorators: bool,
    /// Overrides the argument's metatype during schema lookup.
    pub expected_type: Option<Metatype>,
}

impl Default for PipeOptions {
    fn default() -> Self {
        Self {
            error_http_status_code: StatusCode::BAD_REQUEST,
            exception_factory: None,
            validate_custom_decorators: false,
            expected_type: None,
        }
    }
}

impl PipeOptions {
    pub fn error_status(mut self, status: StatusCode) -> Self {
        self.error_http_status_code = status;
        self
    }

    pub fn exception_factory<F, O>(mut self, factory: F) -> Self
    where
        F: Fn(&[Issue]) -> O + Send + Sync + 'static,
        O: Into<FactoryOutput>,
    {
        self.exception_factory = Some(Arc::new(move |issues| factory(issues).into()));
        self
    }

    pub fn validate_custom_decorators(mut self, enabled: bool) -> Self {
        self.validate_custom_decorators = enabled;
        self
    }

    pub fn expected_type(mut self, metatype: Metatype) -> Self {
        self.expected_type = Some(metatype);
        self
    }
}

impl fmt::Debug for PipeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeOptions")
            .field("error_http_status_code", &self.error_http_status_code)
            .field("exception_factory", &self.exception_factory.is_some())
            .field("validate_custom_decorators", &self.validate_custom_decorators)
            .field("expected_type", &self.expected_type)
            .finish()
    }
}

/// Where an argument came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Body,
    Query,
    Param,
    /// Produced by an application-defined extractor.
    Custom,
}

/// Describes one handler argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentMetadata {
    pub kind: ParamKind,
    pub metatype: Option<Metatype>,
}

impl ArgumentMetadata {
    pub fn new(kind: ParamKind, metatype: Option<Metatype>) -> Self {
        Self { kind, metatype }
    }

    pub fn body<T: ?Sized + 'static>() -> Self {
        Self::new(ParamKind::Body, Some(Metatype::of::<T>()))
    }

    pub fn query<T: ?Sized + 'static>() -> Self {
        Self::new(ParamKind::Query, Some(Metatype::of::<T>()))
    }

    pub fn param<T: ?Sized + 'static>() -> Self {
        Self::new(ParamKind::Param, Some(Metatype::of::<T>()))
    }

    pub fn custom<T: ?Sized + 'static>() -> Self {
        Self::new(ParamKind::Custom, Some(Metatype::of::<T>()))
    }
}

/// How the pipe finds its schema.
#[derive(Debug, Clone)]
pub enum PipeMode {
    Bound(SchemaRef),
    TypeDriven(MetadataRegistry),
}

/// Validates inbound values against standard schemas.
#[derive(Debug, Clone)]
pub struct ValidationPipe {
    mode: PipeMode,
    options: PipeOptions,
}

impl ValidationPipe {
    /// A pipe that always validates with `schema`.
    pub fn bound(schema: SchemaRef) -> Self {
        Self::with_options(PipeMode::Bound(schema), PipeOptions::default())
    }

    /// A pipe that looks the schema up per argument type.
    pub fn type_driven(registry: MetadataRegistry) -> Self {
        Self::with_options(PipeMode::TypeDriven(registry), PipeOptions::default())
    }

    pub fn with_options(mode: PipeMode, options: PipeOptions) -> Self {
        Self { mode, options }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.mode, PipeMode::Bound(_))
    }

    pub fn options(&self) -> &PipeOptions {
        &self.options
    }

    /// The schema `transform` would use for `metadata`, or `None` to skip.
    pub fn resolve_schema(&self, metadata: &ArgumentMetadata) -> Option<SchemaRef> {
        let registry = match &self.mode {
            PipeMode::Bound(schema) => return Some(Arc::clone(schema)),
            PipeMode::TypeDriven(registry) => registry,
        };

        if metadata.kind == ParamKind::Custom && !self.options.validate_custom_decorators {
            tracing::debug!("skipping custom argument");
            return None;
        }

        let Some(metatype) = self.options.expected_type.or(metadata.metatype) else {
            tracing::debug!(kind = ?metadata.kind, "skipping argument without metatype");
            return None;
        };

        if metatype.is_primitive() {
            tracing::debug!(ty = metatype.type_name(), "skipping primitive argument");
            return None;
        }

        let schema = registry
            .static_schema_for(&metatype)
            .or_else(|| registry.schema_for(&metatype));
        if schema.is_none() {
            tracing::debug!(ty = metatype.type_name(), "no schema registered, skipping");
        }
        schema
    }

    /// Validate `value`, returning the schema's output value on success.
    ///
    /// # Errors
    ///
    /// Returns the configured [`HttpException`] when the schema reports
    /// issues.
    pub async fn transform(
        &self,
        value: Value,
        metadata: &ArgumentMetadata,
    ) -> Result<Value, HttpException> {
        let Some(schema) = self.resolve_schema(metadata) else {
            return Ok(value);
        };

        let outcome = schema.validate(value).resolve().await;
        outcome
            .into_result()
            .map_err(|issues| self.raise(schema.as_ref(), &issues))
    }

    fn raise(&self, schema: &dyn StandardSchema, issues: &[Issue]) -> HttpException {
        tracing::debug!(
            vendor = schema.vendor(),
            count = issues.len(),
            "argument failed validation"
        );
        match &self.options.exception_factory {
            Some(factory) => match factory(issues) {
                FactoryOutput::Exception(exception) => exception,
                FactoryOutput::Payload(payload) => HttpException::bad_request(payload),
            },
            None => HttpException::validation(
                self.options.error_http_status_code,
                VALIDATION_FAILED,
                issues,
            ),
        }
    }
}
