//! # DTO Factory
//!
//! [`create_standard_dto`] binds a schema to a Rust type, producing a
//! [`DtoClass`]: the type's metatype, a shared reference to the schema, and
//! optional per-field documentation. Registering the class in a
//! [`MetadataRegistry`](crate::MetadataRegistry) is what lets a type-driven
//! pipe recover the schema from the argument type alone.
//!
//! No validation logic lives here.

use std::fmt;
use std::sync::Arc;

use crate::docs::{derive_field_docs, merge_field_docs, FieldDocs};
use crate::metatype::Metatype;
use crate::schema::SchemaRef;

/// Options accepted by [`create_standard_dto`].
#[derive(Debug, Clone, Default)]
pub struct DtoOptions {
    /// Explicit per-field documentation. Merged over anything derivable from
    /// the schema's JSON-Schema export.
    pub openapi: Option<FieldDocs>,
    /// Component name override. Defaults to the type's short name.
    pub name: Option<String>,
}

impl DtoOptions {
    pub fn with_openapi(mut self, docs: FieldDocs) -> Self {
        self.openapi = Some(docs);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

struct DtoInner {
    name: String,
    metatype: Metatype,
    schema: SchemaRef,
    openapi: Option<FieldDocs>,
}

/// A schema bound to a type. Cheap to clone; clones share the same schema.
#[derive(Clone)]
pub struct DtoClass {
    inner: Arc<DtoInner>,
}

impl DtoClass {
    /// Component name used in documentation.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn metatype(&self) -> Metatype {
        self.inner.metatype
    }

    /// The schema handed to the factory, never a copy.
    pub fn schema(&self) -> &SchemaRef {
        &self.inner.schema
    }

    /// Per-field documentation: explicit metadata merged over what the
    /// schema exports, or `None` when neither is available.
    pub fn openapi_metadata(&self) -> Option<FieldDocs> {
        let derived = self
            .inner
            .schema
            .json_schema()
            .and_then(|exported| derive_field_docs(&exported));
        merge_field_docs(derived, self.inner.openapi.as_ref())
    }
}

impl fmt::Debug for DtoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DtoClass")
            .field("name", &self.inner.name)
            .field("metatype", &self.inner.metatype)
            .field("vendor", &self.inner.schema.vendor())
            .finish()
    }
}

/// Bind `schema` to the type `T`.
pub fn create_standard_dto<T: 'static>(schema: SchemaRef, options: DtoOptions) -> DtoClass {
    let metatype = Metatype::of::<T>();
    let name = options
        .name
        .unwrap_or_else(|| metatype.short_name().to_string());
    DtoClass {
        inner: Arc::new(DtoInner {
            name,
            metatype,
            schema,
            openapi: options.openapi,
        }),
    }
}
