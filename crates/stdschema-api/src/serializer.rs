//! # Response Serializer
//!
//! Filters handler output through the schema of the handler's declared
//! [`ResponseShape`]. The schema does the filtering: whatever its validation
//! returns as the accepted value is what the client sees. The serializer
//! never enumerates or removes fields itself.
//!
//! Output that the declared schema rejects is a server defect, not a client
//! error. It is reported as a 500 with the structured validation body and is
//! never replaced by a best-effort partial value.
//!
//! [`serialize_response`] wires this into axum as a middleware keyed by the
//! request method and the matched route template.

use axum::body::{to_bytes, Body};
use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use stdschema_core::{HandlerKey, Issue, MetadataRegistry, ResponseShape, StandardSchema};
use thiserror::Error;

use crate::error::{HttpException, RESPONSE_VALIDATION_FAILED};

/// Why a handler's output could not be serialized.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SerializeError {
    /// The handler declares a collection response but returned something else.
    #[error("{handler} declares an array response but returned {found}")]
    NotAnArray {
        handler: HandlerKey,
        found: &'static str,
    },

    /// The declared schema rejected the output.
    #[error("{handler} returned a value its response schema rejects ({} issues)", issues.len())]
    Rejected {
        handler: HandlerKey,
        issues: Vec<Issue>,
    },
}

impl From<SerializeError> for HttpException {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::Rejected { issues, .. } => HttpException::validation(
                StatusCode::INTERNAL_SERVER_ERROR,
                RESPONSE_VALIDATION_FAILED,
                &issues,
            ),
            usage @ SerializeError::NotAnArray { .. } => HttpException::with_payload(
                StatusCode::INTERNAL_SERVER_ERROR,
                Value::String(usage.to_string()),
            ),
        }
    }
}

/// Applies declared response shapes to handler output.
#[derive(Debug, Clone)]
pub struct ResponseSerializer {
    registry: MetadataRegistry,
}

impl ResponseSerializer {
    pub fn new(registry: MetadataRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Filter `value` through the response shape declared for `handler`.
    /// Handlers without a declared shape get their value back unchanged.
    ///
    /// # Errors
    ///
    /// [`SerializeError::NotAnArray`] when a collection shape meets a
    /// non-array value; [`SerializeError::Rejected`] with the schema's own
    /// issues when validation fails. For collections the issues are those of
    /// the first rejected element.
    pub async fn serialize(
        &self,
        handler: &HandlerKey,
        value: Value,
    ) -> Result<Value, SerializeError> {
        let Some(shape) = self.registry.response_for(handler) else {
            return Ok(value);
        };

        let result = match &shape {
            ResponseShape::One(dto) => filter(dto.schema().as_ref(), value).await,
            ResponseShape::Many(dto) => {
                let Value::Array(items) = value else {
                    let found = json_kind(&value);
                    tracing::warn!(%handler, found, "array response shape on non-array value");
                    return Err(SerializeError::NotAnArray {
                        handler: handler.clone(),
                        found,
                    });
                };
                let schema = dto.schema().as_ref();
                let mut filtered = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    match filter(schema, item).await {
                        Ok(item) => filtered.push(item),
                        Err(issues) => {
                            tracing::error!(%handler, index, "collection element rejected");
                            return Err(rejected(handler, issues));
                        }
                    }
                }
                Ok(Value::Array(filtered))
            }
        };

        result.map_err(|issues| rejected(handler, issues))
    }
}

async fn filter(schema: &dyn StandardSchema, value: Value) -> Result<Value, Vec<Issue>> {
    schema.validate(value).resolve().await.into_result()
}

fn rejected(handler: &HandlerKey, issues: Vec<Issue>) -> SerializeError {
    tracing::error!(
        %handler,
        count = issues.len(),
        first = %issues.first().map(ToString::to_string).unwrap_or_default(),
        "response failed its declared schema"
    );
    SerializeError::Rejected {
        handler: handler.clone(),
        issues,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Middleware applying [`ResponseSerializer`] to successful JSON responses.
///
/// ```ignore
/// Router::new()
///     .route("/users", get(list_users))
///     .route_layer(from_fn_with_state(serializer, serialize_response))
/// ```
///
/// Must be installed with `route_layer` (or `layer` on a router that only
/// holds routes) so [`MatchedPath`] is available.
pub async fn serialize_response(
    State(serializer): State<ResponseSerializer>,
    request: Request,
    next: Next,
) -> Response {
    let handler = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| HandlerKey::new(request.method().as_str(), matched.as_str()));

    let response = next.run(request).await;

    let Some(handler) = handler else {
        return response;
    };
    if !response.status().is_success() || !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(%handler, error = %e, "failed to buffer response body");
            return HttpException::internal().into_response();
        }
    };
    let Ok(value) = serde_json::from_slice::<Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    match serializer.serialize(&handler, value).await {
        Ok(filtered) => match serde_json::to_vec(&filtered) {
            Ok(encoded) => {
                parts.headers.remove(header::CONTENT_LENGTH);
                Response::from_parts(parts, Body::from(encoded))
            }
            Err(e) => {
                tracing::error!(%handler, error = %e, "failed to encode filtered response");
                HttpException::internal().into_response()
            }
        },
        Err(err) => HttpException::from(err).into_response(),
    }
}
