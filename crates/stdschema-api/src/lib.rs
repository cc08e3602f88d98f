//! # stdschema-api: Axum Integration for Standard Schemas
//!
//! Connects any [`StandardSchema`](stdschema_core::StandardSchema) to the
//! axum request pipeline.
//!
//! ## Request path
//!
//! ```text
//! request → Validated<T> / ValidatedQuery<T> / ValidatedPath<T>
//!         → ValidationPipe (bound schema, DTO static schema, or attached schema)
//!         → handler
//! ```
//!
//! ## Response path
//!
//! ```text
//! handler → serialize_response middleware
//!         → ResponseSerializer (declared ResponseShape of `METHOD /route/{template}`)
//!         → client
//! ```
//!
//! Failures on either path are [`HttpException`](error::HttpException)s with
//! the structured `{ statusCode, message, errors }` body.
//!
//! ## Demo server
//!
//! [`app`] assembles the demo router: the users API, `/openapi.json` and an
//! unvalidated liveness probe.

pub mod config;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod pipe;
pub mod routes;
pub mod serializer;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::serializer::serialize_response;
use crate::state::AppState;

pub use error::HttpException;
pub use extractors::{Validated, ValidatedPath, ValidatedQuery};
pub use pipe::{ArgumentMetadata, ParamKind, PipeMode, PipeOptions, ValidationPipe};
pub use serializer::{ResponseSerializer, SerializeError};

/// Assemble the application router.
///
/// The response serializer runs as a route layer so it sees the matched
/// route template of every request it filters.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::users::router())
        .route_layer(from_fn_with_state(
            state.serializer.clone(),
            serialize_response,
        ))
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new().route("/health/liveness", get(liveness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}
