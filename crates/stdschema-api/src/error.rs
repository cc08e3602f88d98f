//! # HTTP Exceptions
//!
//! [`HttpException`] is the single framework-level error raised by pipes,
//! extractors and the response serializer. It carries an HTTP status and a
//! JSON response body and implements `axum::response::IntoResponse`.
//!
//! Validation failures use the [`ValidationErrorBody`] shape:
//!
//! ```json
//! { "statusCode": 400, "message": "Validation failed",
//!   "errors": [{ "path": ["address", 0], "message": "..." }] }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stdschema_core::{Issue, PropertyKey};
use thiserror::Error;
use utoipa::ToSchema;

/// Message used for rejected request input.
pub const VALIDATION_FAILED: &str = "Validation failed";

/// Message used when a handler's output fails its declared response schema.
pub const RESPONSE_VALIDATION_FAILED: &str = "Response validation failed";

/// One flattened issue in a validation error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorEntry {
    /// Property keys leading to the offending value; empty for the root.
    #[schema(value_type = Vec<Object>)]
    pub path: Vec<PropertyKey>,
    pub message: String,
}

impl From<&Issue> for ErrorEntry {
    fn from(issue: &Issue) -> Self {
        Self {
            path: issue.flat_path(),
            message: issue.message.clone(),
        }
    }
}

/// Structured JSON body for validation failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorBody {
    pub status_code: u16,
    pub message: String,
    pub errors: Vec<ErrorEntry>,
}

impl ValidationErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>, issues: &[Issue]) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            errors: issues.iter().map(ErrorEntry::from).collect(),
        }
    }
}

/// A framework-level HTTP error: status plus JSON response body.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("HTTP {status}: {response}")]
pub struct HttpException {
    status: StatusCode,
    response: Value,
}

impl HttpException {
    pub fn new(status: StatusCode, response: Value) -> Self {
        Self { status, response }
    }

    /// 400 Bad Request. JSON objects become the response body as-is; any
    /// other payload is wrapped as `{ statusCode, message, error }`.
    pub fn bad_request(payload: impl Into<Value>) -> Self {
        Self::with_payload(StatusCode::BAD_REQUEST, payload.into())
    }

    /// 500 Internal Server Error with a generic message.
    pub fn internal() -> Self {
        Self::with_payload(
            StatusCode::INTERNAL_SERVER_ERROR,
            Value::String("Internal server error".to_string()),
        )
    }

    /// Structured validation error for `issues` with the given status.
    pub fn validation(status: StatusCode, message: &str, issues: &[Issue]) -> Self {
        let body = ValidationErrorBody::new(status, message, issues);
        Self {
            status,
            response: serde_json::to_value(body).unwrap_or_else(|_| {
                json!({ "statusCode": status.as_u16(), "message": message })
            }),
        }
    }

    /// Same as [`HttpException::bad_request`] for an arbitrary status.
    pub fn with_payload(status: StatusCode, payload: Value) -> Self {
        let response = match payload {
            Value::Object(_) => payload,
            other => json!({
                "statusCode": status.as_u16(),
                "message": other,
                "error": status.canonical_reason().unwrap_or("Error"),
            }),
        };
        Self { status, response }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The JSON body sent to the client.
    pub fn response(&self) -> &Value {
        &self.response
    }
}

impl IntoResponse for HttpException {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, body = %self.response, "server error");
        } else {
            tracing::debug!(status = %self.status, body = %self.response, "client error");
        }
        (self.status, Json(self.response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stdschema_core::PathSegment;

    fn issues() -> Vec<Issue> {
        vec![
            Issue::at(
                "expected string",
                [
                    stdschema_core::PathItem::from("user"),
                    PathSegment::new("email").into(),
                ],
            ),
            Issue::new("unexpected shape"),
        ]
    }

    #[test]
    fn validation_body_flattens_paths() {
        let err = HttpException::validation(StatusCode::BAD_REQUEST, VALIDATION_FAILED, &issues());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.response(),
            &json!({
                "statusCode": 400,
                "message": "Validation failed",
                "errors": [
                    {"path": ["user", "email"], "message": "expected string"},
                    {"path": [], "message": "unexpected shape"}
                ]
            })
        );
    }

    #[test]
    fn bad_request_keeps_object_payloads() {
        let err = HttpException::bad_request(json!({"code": "X"}));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.response(), &json!({"code": "X"}));
    }

    #[test]
    fn bad_request_wraps_scalar_payloads() {
        let err = HttpException::bad_request("nope");
        assert_eq!(
            err.response(),
            &json!({"statusCode": 400, "message": "nope", "error": "Bad Request"})
        );
    }

    #[test]
    fn internal_is_generic() {
        let err = HttpException::internal();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response()["error"], "Internal Server Error");
    }

    #[test]
    fn display_includes_status() {
        let err = HttpException::bad_request("nope");
        assert!(err.to_string().starts_with("HTTP 400 Bad Request"));
    }

    // ── into_response tests ──────────────────────────────────────

    use http_body_util::BodyExt;

    async fn response_parts(err: HttpException) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn into_response_uses_status_and_body() {
        let err = HttpException::validation(
            StatusCode::UNPROCESSABLE_ENTITY,
            VALIDATION_FAILED,
            &issues(),
        );
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body: ValidationErrorBody = serde_json::from_value(body).unwrap();
        assert_eq!(body.status_code, 422);
        assert_eq!(body.errors.len(), 2);
        assert_eq!(body.errors[0].path, vec![PropertyKey::from("user"), PropertyKey::from("email")]);
    }
}
