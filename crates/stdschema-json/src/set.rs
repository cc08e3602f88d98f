//! # Schema Sets
//!
//! Loads a directory of `*.schema.json` files and compiles any of them into
//! a [`JsonSchema`] whose cross-schema `$ref`s resolve against the set.
//!
//! Schemas are indexed under their `$id` and their bare filename. Unknown
//! URIs resolve to the permissive schema `{}` so compilation never reaches
//! for the network.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri};
use serde_json::Value;

use crate::schema::JsonSchema;
use crate::SchemaBuildError;

/// Local retriever that resolves `$ref` URIs to schemas loaded in memory.
struct LocalSchemaRetriever {
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.schemas_by_uri.get(filename) {
            return Ok(value.clone());
        }

        tracing::warn!(uri = uri_str, "unresolved $ref, substituting permissive schema");
        Ok(serde_json::json!({}))
    }
}

/// A directory of JSON schemas, compiled on demand.
#[derive(Debug)]
pub struct SchemaSet {
    schema_dir: PathBuf,
    /// Filename → parsed document.
    schemas: HashMap<String, Value>,
}

impl SchemaSet {
    /// Load every `*.schema.json` file in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaBuildError::Load`] if the directory cannot be read or a
    /// file is not valid JSON.
    pub fn load(schema_dir: impl AsRef<Path>) -> Result<Self, SchemaBuildError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut schemas = HashMap::new();

        let entries = std::fs::read_dir(&schema_dir).map_err(|e| SchemaBuildError::Load {
            schema_name: schema_dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".schema.json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&content).map_err(|e| SchemaBuildError::Load {
                schema_name: name.to_string(),
                reason: format!("invalid JSON: {e}"),
            })?;
            schemas.insert(name.to_string(), value);
        }

        tracing::info!(
            dir = %schema_dir.display(),
            count = schemas.len(),
            "loaded schema set"
        );
        Ok(Self { schema_dir, schemas })
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Loaded filenames, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn document(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Compile the schema stored under `name` with every other schema of the
    /// set available for `$ref` resolution.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaBuildError::NotFound`] for unknown names and
    /// [`SchemaBuildError::Compile`] for invalid documents.
    pub fn compile(&self, name: &str) -> Result<JsonSchema, SchemaBuildError> {
        let document = self
            .schemas
            .get(name)
            .ok_or_else(|| SchemaBuildError::NotFound(name.to_string()))?;

        let mut schemas_by_uri = HashMap::new();
        for (filename, value) in &self.schemas {
            if let Some(id) = value.get("$id").and_then(Value::as_str) {
                schemas_by_uri.insert(id.to_string(), value.clone());
            }
            schemas_by_uri.insert(filename.clone(), value.clone());
        }

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(LocalSchemaRetriever {
            schemas_by_uri: schemas_by_uri.clone(),
        });
        JsonSchema::compile(name.to_string(), document.clone(), schemas_by_uri, &opts)
    }
}
