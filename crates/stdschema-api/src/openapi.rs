//! # OpenAPI Bridge
//!
//! Turns standard schemas into `utoipa` component schemas at startup.
//!
//! Documentation comes from two sources, merged field by field with explicit
//! metadata winning:
//! - the schema's own JSON-Schema export ([`StandardSchema::json_schema`]),
//! - per-field metadata passed to the DTO factory.
//!
//! A schema with neither cannot be documented and yields
//! [`OpenApiError::MissingMetadata`].
//!
//! Serves the assembled document at `/openapi.json`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value};
use stdschema_core::{
    derive_field_docs, merge_field_docs, DtoClass, FieldDocs, MetadataRegistry, StandardSchema,
};
use thiserror::Error;
use utoipa::openapi::schema::Schema;
use utoipa::openapi::{ComponentsBuilder, OpenApi as OpenApiDocument};
use utoipa::OpenApi;

use crate::error::{ErrorEntry, ValidationErrorBody};
use crate::state::AppState;

#[derive(Error, Debug)]
pub enum OpenApiError {
    /// The schema exports no JSON Schema and no field metadata was supplied.
    #[error("schema from vendor '{vendor}' has no JSON-Schema export and no field metadata")]
    MissingMetadata { vendor: String },

    #[error("cannot convert to an OpenAPI schema: {0}")]
    Conversion(#[from] serde_json::Error),
}

/// Framework-level components present in every generated document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "stdschema",
        description = "Request and response validation through standard schemas."
    ),
    components(schemas(ValidationErrorBody, ErrorEntry))
)]
pub struct ApiDoc;

/// Build a component schema for `schema`, merging `metadata` over whatever
/// the schema's JSON-Schema export documents.
///
/// # Errors
///
/// [`OpenApiError::MissingMetadata`] when there is nothing to document from;
/// [`OpenApiError::Conversion`] when the result is not a valid OpenAPI schema.
pub fn schema_to_openapi(
    schema: &dyn StandardSchema,
    metadata: Option<&FieldDocs>,
) -> Result<Schema, OpenApiError> {
    let exported = schema.json_schema();
    let derived = exported.as_ref().and_then(derive_field_docs);

    let fragment = match (merge_field_docs(derived, metadata), exported) {
        (Some(docs), _) => object_fragment(&docs),
        // Non-object exports (scalars, arrays) are documented as-is.
        (None, Some(mut exported)) => {
            if let Some(fields) = exported.as_object_mut() {
                fields.remove("$schema");
                fields.remove("$id");
            }
            exported
        }
        (None, None) => {
            return Err(OpenApiError::MissingMetadata {
                vendor: schema.vendor().to_string(),
            })
        }
    };

    Ok(serde_json::from_value(fragment)?)
}

fn object_fragment(docs: &FieldDocs) -> Value {
    let properties: Map<String, Value> = docs
        .iter()
        .map(|(name, doc)| (name.clone(), doc.to_json_schema()))
        .collect();
    let required: Vec<Value> = docs
        .iter()
        .filter(|(_, doc)| doc.required)
        .map(|(name, _)| Value::String(name.clone()))
        .collect();

    let mut fragment = Map::new();
    fragment.insert("type".into(), Value::String("object".into()));
    fragment.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        fragment.insert("required".into(), Value::Array(required));
    }
    Value::Object(fragment)
}

/// Add `dto` to `components.schemas` under its name.
///
/// # Errors
///
/// See [`schema_to_openapi`].
pub fn register_dto(openapi: &mut OpenApiDocument, dto: &DtoClass) -> Result<(), OpenApiError> {
    let schema = schema_to_openapi(dto.schema().as_ref(), dto.openapi_metadata().as_ref())?;
    openapi
        .components
        .get_or_insert_with(|| ComponentsBuilder::new().build())
        .schemas
        .insert(dto.name().to_string(), schema.into());
    tracing::debug!(dto = dto.name(), "documented DTO");
    Ok(())
}

/// Assemble the document for every DTO in `registry`, in name order.
///
/// # Errors
///
/// Fails on the first DTO that cannot be documented.
pub fn document(
    registry: &MetadataRegistry,
    title: &str,
    version: &str,
) -> Result<OpenApiDocument, OpenApiError> {
    let mut doc = ApiDoc::openapi();
    doc.info.title = title.to_string();
    doc.info.version = version.to_string();

    let mut dtos = registry.dtos();
    dtos.sort_by(|a, b| a.name().cmp(b.name()));
    for dto in &dtos {
        register_dto(&mut doc, dto)?;
    }
    Ok(doc)
}

/// Serves the OpenAPI JSON document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json(State(state): State<AppState>) -> Json<OpenApiDocument> {
    Json(state.openapi.as_ref().clone())
}
