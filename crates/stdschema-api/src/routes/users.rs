//! # Users API
//!
//! | Method | Path          | Input                           | Response shape |
//! |--------|---------------|---------------------------------|----------------|
//! | POST   | `/users`      | [`CreateUser`] body (DTO)       | `User`         |
//! | GET    | `/users`      | [`ListUsers`] query (attached)  | `[User]`       |
//! | GET    | `/users/{id}` | [`UserPath`] params (attached)  | `User`         |
//!
//! Handlers return full [`UserRecord`]s. The `User` response shape is what
//! keeps the password out of responses.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stdschema_core::{
    create_standard_dto, DtoOptions, FieldDoc, FieldDocs, HandlerKey, MetadataRegistry,
};
use stdschema_json::{JsonSchema, SchemaBuildError};

use crate::error::HttpException;
use crate::extractors::{Validated, ValidatedPath, ValidatedQuery};
use crate::state::AppState;

/// Request body of `POST /users`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub name: String,
}

/// Query of `GET /users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsers {
    pub name: Option<String>,
}

/// Path parameters of `GET /users/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPath {
    pub id: String,
}

/// Stored user. Never returned without going through the `User` shape.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub password: String,
}

fn create_user_schema() -> Value {
    json!({
        "title": "CreateUser",
        "type": "object",
        "properties": {
            "email": {"type": "string", "pattern": "^[^@\\s]+@[^@\\s]+$", "maxLength": 254},
            "name": {"type": "string", "minLength": 1, "maxLength": 100},
            "password": {"type": "string", "minLength": 8}
        },
        "required": ["email", "name", "password"]
    })
}

fn user_schema() -> Value {
    json!({
        "title": "User",
        "type": "object",
        "properties": {
            "id": {"type": "integer", "minimum": 1},
            "email": {"type": "string"},
            "name": {"type": "string"}
        },
        "required": ["id", "email", "name"]
    })
}

fn list_users_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "minLength": 1}
        }
    })
}

fn user_path_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "pattern": "^[1-9][0-9]{0,18}$"}
        },
        "required": ["id"]
    })
}

/// Register this module's DTOs, attached schemas and response shapes.
pub fn register(registry: &MetadataRegistry) -> Result<(), SchemaBuildError> {
    let mut create_docs = FieldDocs::new();
    create_docs.insert(
        "email".into(),
        FieldDoc::default()
            .format("email")
            .example(json!("ada@example.org")),
    );
    create_docs.insert(
        "password".into(),
        FieldDoc::default().description("At least 8 characters. Never returned."),
    );

    let create_user = create_standard_dto::<CreateUser>(
        JsonSchema::new(create_user_schema())?.into_ref(),
        DtoOptions::default().with_openapi(create_docs),
    );
    let user = create_standard_dto::<User>(
        JsonSchema::new(user_schema())?.into_ref(),
        DtoOptions::default(),
    );
    registry.register_dto(&create_user);
    registry.register_dto(&user);

    registry.attach_schema::<ListUsers>(JsonSchema::new(list_users_schema())?.into_ref());
    registry.attach_schema::<UserPath>(JsonSchema::new(user_path_schema())?.into_ref());

    registry.attach_response(HandlerKey::new("POST", "/users"), user.clone());
    registry.attach_response(HandlerKey::new("GET", "/users"), [user.clone()]);
    registry.attach_response(HandlerKey::new("GET", "/users/{id}"), user);
    Ok(())
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
}

/// POST /users: Register a user.
async fn create_user(
    State(state): State<AppState>,
    Validated(req): Validated<CreateUser>,
) -> (StatusCode, Json<UserRecord>) {
    let record = state.users.create(|id| UserRecord {
        id,
        email: req.email,
        name: req.name,
        password: req.password,
    });
    tracing::info!(id = record.id, "user created");
    (StatusCode::CREATED, Json(record))
}

/// GET /users: List users, optionally filtered by exact name.
async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListUsers>,
) -> Json<Vec<UserRecord>> {
    let users = state
        .users
        .list()
        .into_iter()
        .filter(|user| query.name.as_ref().map_or(true, |name| &user.name == name))
        .collect();
    Json(users)
}

/// GET /users/{id}: Look up one user.
async fn get_user(
    State(state): State<AppState>,
    ValidatedPath(path): ValidatedPath<UserPath>,
) -> Result<Json<UserRecord>, HttpException> {
    let id: u64 = path
        .id
        .parse()
        .map_err(|_| HttpException::bad_request(format!("invalid user id '{}'", path.id)))?;
    state.users.get(id).map(Json).ok_or_else(|| {
        HttpException::with_payload(
            StatusCode::NOT_FOUND,
            Value::String(format!("user {id} not found")),
        )
    })
}
