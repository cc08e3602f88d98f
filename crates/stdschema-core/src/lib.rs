//! # stdschema-core: The Standard Schema Contract
//!
//! This crate defines the structural agreement every validator plugged into
//! stdschema must honor, plus the descriptors that let the request pipeline
//! find a validator for a value without reflection.
//!
//! ## Key Design Principles
//!
//! 1. **One capability interface, many vendors.** Any validator implementing
//!    [`StandardSchema`] works with the pipe and the serializer. There is no
//!    per-library special-casing anywhere downstream.
//!
//! 2. **Ready or pending, awaited uniformly.** [`StandardSchema::validate`]
//!    returns a [`Validation`] that is either already resolved or a boxed
//!    future. Callers always `.resolve().await`.
//!
//! 3. **Side tables instead of decorators.** Class-level schema attachment,
//!    DTO static schemas, and handler response shapes live in a
//!    [`MetadataRegistry`] populated by explicit registration calls.
//!
//! 4. **Identity, never copies.** A [`SchemaRef`] is an `Arc`. DTO classes and
//!    registry entries hold the same allocation the caller handed in.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `stdschema-*` crates (leaf of the DAG).
//! - No HTTP types here; status codes and responses belong to `stdschema-api`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod docs;
pub mod dto;
pub mod issue;
pub mod metadata;
pub mod metatype;
pub mod outcome;
pub mod schema;

pub use docs::{derive_field_docs, merge_field_docs, FieldDoc, FieldDocs};
pub use dto::{create_standard_dto, DtoClass, DtoOptions};
pub use issue::{Issue, PathItem, PathSegment, PropertyKey};
pub use metadata::{HandlerKey, MetadataRegistry, ResponseShape};
pub use metatype::{Metatype, PrimitiveKind};
pub use outcome::ValidationOutcome;
pub use schema::{
    from_async_fn, from_fn, same_schema, AsyncFnSchema, FnSchema, SchemaFuture, SchemaRef,
    StandardSchema, Validation, STANDARD_VERSION,
};
