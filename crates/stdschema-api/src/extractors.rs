//! # Validating Extractors
//!
//! Axum extractors that run the request value through the application's
//! [`ValidationPipe`] before handing a typed value to the handler:
//!
//! | Extractor             | Source          | `ParamKind` |
//! |-----------------------|-----------------|-------------|
//! | [`Validated<T>`]      | JSON body       | `Body`      |
//! | [`ValidatedQuery<T>`] | query string    | `Query`     |
//! | [`ValidatedPath<T>`]  | path parameters | `Param`     |
//!
//! The pipe resolves the schema from `T`'s [`Metatype`](stdschema_core::Metatype).
//! The value the schema accepted (after stripping) is deserialized into `T`.
//! Query and path values always arrive as strings.
//!
//! The router state must provide the pipe: `Arc<ValidationPipe>: FromRef<S>`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::HttpException;
use crate::pipe::{ArgumentMetadata, ValidationPipe};

/// Validated JSON request body.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

/// Validated query string.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

/// Validated path parameters.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<S, T> FromRequest<S> for Validated<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
    Arc<ValidationPipe>: FromRef<S>,
{
    type Rejection = HttpException;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;
        let pipe = Arc::<ValidationPipe>::from_ref(state);
        let accepted = pipe.transform(value, &ArgumentMetadata::body::<T>()).await?;
        into_typed(accepted).map(Self)
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
    Arc<ValidationPipe>: FromRef<S>,
{
    type Rejection = HttpException;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;
        let pipe = Arc::<ValidationPipe>::from_ref(state);
        let accepted = pipe
            .transform(string_map(params), &ArgumentMetadata::query::<T>())
            .await?;
        into_typed(accepted).map(Self)
    }
}

impl<S, T> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
    Arc<ValidationPipe>: FromRef<S>,
{
    type Rejection = HttpException;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;
        let pipe = Arc::<ValidationPipe>::from_ref(state);
        let accepted = pipe
            .transform(string_map(params), &ArgumentMetadata::param::<T>())
            .await?;
        into_typed(accepted).map(Self)
    }
}

fn rejected(status: StatusCode, message: String) -> HttpException {
    tracing::debug!(%status, %message, "request extraction rejected");
    HttpException::with_payload(status, Value::String(message))
}

fn string_map(params: HashMap<String, String>) -> Value {
    Value::Object(
        params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}

fn into_typed<T: DeserializeOwned>(value: Value) -> Result<T, HttpException> {
    serde_json::from_value(value)
        .map_err(|e| HttpException::bad_request(format!("invalid request value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::{get, post};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use serde_json::json;
    use stdschema_core::{
        create_standard_dto, from_fn, DtoOptions, Issue, MetadataRegistry, ValidationOutcome,
    };
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Greeting {
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: String,
    }

    /// Accepts only a non-empty string field named `field`, dropping the rest.
    fn required_string(field: &'static str) -> stdschema_core::SchemaRef {
        from_fn("test", move |value: Value| match value.get(field) {
            Some(Value::String(s)) if !s.is_empty() => {
                ValidationOutcome::success(json!({ field: s }))
            }
            _ => ValidationOutcome::failure(vec![Issue::at("required", [field])]),
        })
    }

    fn router() -> Router {
        let registry = MetadataRegistry::new();
        registry.register_dto(&create_standard_dto::<Greeting>(
            required_string("name"),
            DtoOptions::default(),
        ));
        registry.attach_schema::<Paging>(required_string("page"));
        let pipe = Arc::new(ValidationPipe::type_driven(registry));

        Router::new()
            .route(
                "/greet",
                post(|Validated(g): Validated<Greeting>| async move { format!("hi {}", g.name) }),
            )
            .route(
                "/items",
                get(|ValidatedQuery(p): ValidatedQuery<Paging>| async move { p.page }),
            )
            .route(
                "/items/{name}",
                get(|ValidatedPath(g): ValidatedPath<Greeting>| async move { g.name }),
            )
            .with_state(pipe)
    }

    async fn call(req: axum::http::Request<Body>) -> (StatusCode, String) {
        let resp = router().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn body_is_validated_and_typed() {
        let (status, body) = call(post_json("/greet", r#"{"name":"ada","x":1}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hi ada");
    }

    #[tokio::test]
    async fn invalid_body_is_rejected_with_issues() {
        let (status, body) = call(post_json("/greet", r#"{"name":""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["errors"], json!([{"path": ["name"], "message": "required"}]));
    }

    #[tokio::test]
    async fn malformed_json_keeps_axum_status() {
        let (status, body) = call(post_json("/greet", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["error"], "Bad Request");
    }

    #[tokio::test]
    async fn missing_content_type_is_unsupported_media_type() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/greet")
            .body(Body::from(r#"{"name":"ada"}"#))
            .unwrap();
        let (status, _) = call(req).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn query_and_path_values_are_validated() {
        let request = |uri: &str| {
            axum::http::Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        };
        assert_eq!(call(request("/items?page=2&debug=1")).await, (StatusCode::OK, "2".into()));
        assert_eq!(call(request("/items")).await.0, StatusCode::BAD_REQUEST);
        assert_eq!(call(request("/items/ada")).await, (StatusCode::OK, "ada".into()));
    }
}
