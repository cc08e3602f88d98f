//! # stdschema-json: JSON Schema Vendor
//!
//! A [`StandardSchema`](stdschema_core::StandardSchema) implementation backed
//! by the `jsonschema` crate (Draft 2020-12).
//!
//! ## Behavior
//!
//! - Every violation reported by `jsonschema` becomes one
//!   [`Issue`](stdschema_core::Issue), with its path decoded from the
//!   violation's instance pointer.
//! - Accepted values are returned with undeclared object fields removed
//!   ([`UnknownKeys::Strip`], the default). Schemas that allow additional
//!   properties explicitly keep them.
//! - The raw schema document is exported through `json_schema()` so DTOs can
//!   derive documentation from it.
//!
//! ## Schema Sets
//!
//! [`SchemaSet`] loads every `*.schema.json` file of a directory and resolves
//! cross-schema `$ref`s locally, without network access.

pub mod schema;
pub mod set;
pub mod strip;

use thiserror::Error;

pub use schema::{JsonSchema, UnknownKeys, VENDOR};
pub use set::SchemaSet;

/// Error while loading or compiling a JSON schema.
#[derive(Error, Debug)]
pub enum SchemaBuildError {
    /// The schema file could not be read or parsed.
    #[error("schema load error for '{schema_name}': {reason}")]
    Load {
        /// Schema filename or identifier.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The schema is not a valid JSON Schema document.
    #[error("schema compile error for '{schema_name}': {reason}")]
    Compile {
        /// Schema filename or identifier.
        schema_name: String,
        /// Compiler message from `jsonschema`.
        reason: String,
    },

    /// No schema with that name was loaded.
    #[error("schema not found: {0}")]
    NotFound(String),

    /// IO error reading a schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
