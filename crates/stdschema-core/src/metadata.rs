//! # Metadata Side Tables
//!
//! Out-of-band facts attached to types and handlers, retrievable by key at
//! request time. Three independent tables, each with its own key space so
//! entries never collide:
//!
//! | Table     | Key          | Populated by                       | Read by                 |
//! |-----------|--------------|------------------------------------|-------------------------|
//! | DTOs      | `TypeId`     | [`MetadataRegistry::register_dto`]  | pipe (static schema)    |
//! | Schemas   | `TypeId`     | [`MetadataRegistry::attach_schema`] | pipe (attached schema)  |
//! | Responses | [`HandlerKey`] | [`MetadataRegistry::attach_response`] | response serializer |
//!
//! The registry is cloneable and shares one set of tables between clones.
//! Locks are `parking_lot` and never held across `.await`.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dto::DtoClass;
use crate::metatype::Metatype;
use crate::schema::SchemaRef;

/// Identifies a handler: HTTP method plus route template, e.g. `GET /users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    method: String,
    path: String,
}

impl HandlerKey {
    /// The method is normalized to upper case.
    pub fn new(method: impl AsRef<str>, path: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            path: path.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Declared shape of a handler's return value.
#[derive(Debug, Clone)]
pub enum ResponseShape {
    /// The handler returns one DTO.
    One(DtoClass),
    /// The handler returns a collection of DTOs.
    Many(DtoClass),
}

impl ResponseShape {
    pub fn dto(&self) -> &DtoClass {
        match self {
            Self::One(dto) | Self::Many(dto) => dto,
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        self.dto().schema()
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

impl From<DtoClass> for ResponseShape {
    fn from(dto: DtoClass) -> Self {
        Self::One(dto)
    }
}

/// A one-element array marks the handler as returning a collection.
impl From<[DtoClass; 1]> for ResponseShape {
    fn from([dto]: [DtoClass; 1]) -> Self {
        Self::Many(dto)
    }
}

#[derive(Default)]
struct Tables {
    dtos: HashMap<TypeId, DtoClass>,
    schemas: HashMap<TypeId, SchemaRef>,
    responses: HashMap<HandlerKey, ResponseShape>,
}

/// Shared registry of schema and response-shape metadata.
#[derive(Clone, Default)]
pub struct MetadataRegistry {
    tables: Arc<RwLock<Tables>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `dto` as the static schema holder of its type. Returns the
    /// class previously registered for that type, if any.
    pub fn register_dto(&self, dto: &DtoClass) -> Option<DtoClass> {
        let metatype = dto.metatype();
        tracing::debug!(dto = dto.name(), ty = metatype.type_name(), "registered DTO");
        self.tables
            .write()
            .dtos
            .insert(metatype.type_id(), dto.clone())
    }

    /// The DTO class registered for `metatype`.
    pub fn dto_for(&self, metatype: &Metatype) -> Option<DtoClass> {
        self.tables.read().dtos.get(&metatype.type_id()).cloned()
    }

    /// The static schema of `metatype`, i.e. the schema of its registered DTO.
    pub fn static_schema_for(&self, metatype: &Metatype) -> Option<SchemaRef> {
        self.tables
            .read()
            .dtos
            .get(&metatype.type_id())
            .map(|dto| Arc::clone(dto.schema()))
    }

    /// All registered DTO classes, in no particular order.
    pub fn dtos(&self) -> Vec<DtoClass> {
        self.tables.read().dtos.values().cloned().collect()
    }

    /// Attach `schema` to the type `T`.
    pub fn attach_schema<T: ?Sized + 'static>(&self, schema: SchemaRef) -> Option<SchemaRef> {
        self.attach_schema_to(&Metatype::of::<T>(), schema)
    }

    /// Attach `schema` to the type described by `metatype`.
    pub fn attach_schema_to(&self, metatype: &Metatype, schema: SchemaRef) -> Option<SchemaRef> {
        self.tables
            .write()
            .schemas
            .insert(metatype.type_id(), schema)
    }

    /// The schema attached to `metatype`, if any.
    pub fn schema_for(&self, metatype: &Metatype) -> Option<SchemaRef> {
        self.tables
            .read()
            .schemas
            .get(&metatype.type_id())
            .cloned()
    }

    /// Declare the response shape of a handler.
    pub fn attach_response(
        &self,
        handler: HandlerKey,
        shape: impl Into<ResponseShape>,
    ) -> Option<ResponseShape> {
        let shape = shape.into();
        tracing::debug!(
            %handler,
            dto = shape.dto().name(),
            array = shape.is_array(),
            "declared response shape"
        );
        self.tables.write().responses.insert(handler, shape)
    }

    pub fn response_for(&self, handler: &HandlerKey) -> Option<ResponseShape> {
        self.tables.read().responses.get(handler).cloned()
    }
}

impl fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("MetadataRegistry")
            .field("dtos", &tables.dtos.len())
            .field("schemas", &tables.schemas.len())
            .field("responses", &tables.responses.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{create_standard_dto, DtoOptions};
    use crate::outcome::ValidationOutcome;
    use crate::schema::{from_fn, same_schema};

    struct Widget;
    struct Gadget;

    fn passthrough() -> SchemaRef {
        from_fn("test", ValidationOutcome::success)
    }

    #[test]
    fn schema_and_dto_tables_are_independent() {
        let registry = MetadataRegistry::new();
        let attached = passthrough();
        registry.attach_schema::<Widget>(Arc::clone(&attached));

        let meta = Metatype::of::<Widget>();
        assert!(registry.static_schema_for(&meta).is_none());
        assert!(same_schema(&registry.schema_for(&meta).unwrap(), &attached));

        let dto_schema = passthrough();
        let dto = create_standard_dto::<Widget>(Arc::clone(&dto_schema), DtoOptions::default());
        registry.register_dto(&dto);
        assert!(same_schema(&registry.static_schema_for(&meta).unwrap(), &dto_schema));
        assert!(same_schema(&registry.schema_for(&meta).unwrap(), &attached));
        assert!(registry.schema_for(&Metatype::of::<Gadget>()).is_none());
    }

    #[test]
    fn response_shapes_by_handler() {
        let registry = MetadataRegistry::new();
        let dto = create_standard_dto::<Widget>(passthrough(), DtoOptions::default());

        registry.attach_response(HandlerKey::new("get", "/widgets/{id}"), dto.clone());
        registry.attach_response(HandlerKey::new("GET", "/widgets"), [dto]);

        let one = registry
            .response_for(&HandlerKey::new("GET", "/widgets/{id}"))
            .unwrap();
        assert!(!one.is_array());
        let many = registry.response_for(&HandlerKey::new("GET", "/widgets")).unwrap();
        assert!(many.is_array());
        assert!(registry
            .response_for(&HandlerKey::new("POST", "/widgets"))
            .is_none());
    }

    #[test]
    fn clones_share_tables() {
        let registry = MetadataRegistry::new();
        let clone = registry.clone();
        clone.attach_schema::<Gadget>(passthrough());
        assert!(registry.schema_for(&Metatype::of::<Gadget>()).is_some());
    }

    #[test]
    fn handler_key_display() {
        assert_eq!(HandlerKey::new("post", "/users").to_string(), "POST /users");
    }
}
