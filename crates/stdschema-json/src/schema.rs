//! # JSON Schema Validator
//!
//! [`JsonSchema`] compiles one Draft 2020-12 document and implements the
//! standard schema contract on top of it.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use jsonschema::{ValidationOptions, Validator};
use serde_json::Value;
use stdschema_core::{
    Issue, PathItem, PropertyKey, SchemaRef, StandardSchema, Validation, ValidationOutcome,
};

use crate::strip::strip_unknown;
use crate::SchemaBuildError;

/// Vendor name reported through the standard schema contract.
pub const VENDOR: &str = "jsonschema";

/// What happens to object fields the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Remove them from the accepted value.
    #[default]
    Strip,
    /// Return the accepted value exactly as given.
    Passthrough,
}

/// A compiled JSON Schema implementing [`StandardSchema`].
///
/// `JsonSchema` is `Send + Sync`; the compiled validator is shared by every
/// request that uses it.
pub struct JsonSchema {
    name: String,
    document: Value,
    /// Other documents `$ref`s may point into, keyed by `$id` and filename.
    external: HashMap<String, Value>,
    validator: Validator,
    unknown_keys: UnknownKeys,
}

impl JsonSchema {
    /// Compile `document` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaBuildError::Compile`] if `document` is not a valid schema.
    pub fn new(document: Value) -> Result<Self, SchemaBuildError> {
        let name = document
            .get("title")
            .or_else(|| document.get("$id"))
            .and_then(Value::as_str)
            .unwrap_or("anonymous")
            .to_string();
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        Self::compile(name, document, HashMap::new(), &opts)
    }

    /// Read and compile a schema file.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaBuildError::Load`] if the file cannot be read or is not
    /// JSON, and [`SchemaBuildError::Compile`] if it is not a valid schema.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaBuildError> {
        let path = path.as_ref();
        let schema_name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaBuildError::Load {
            schema_name: schema_name.clone(),
            reason: e.to_string(),
        })?;
        let document: Value = serde_json::from_str(&content).map_err(|e| SchemaBuildError::Load {
            schema_name: schema_name.clone(),
            reason: format!("invalid JSON: {e}"),
        })?;
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        Self::compile(schema_name, document, HashMap::new(), &opts)
    }

    pub(crate) fn compile(
        name: String,
        document: Value,
        external: HashMap<String, Value>,
        opts: &ValidationOptions,
    ) -> Result<Self, SchemaBuildError> {
        let validator = opts
            .build(&document)
            .map_err(|e| SchemaBuildError::Compile {
                schema_name: name.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            name,
            document,
            external,
            validator,
            unknown_keys: UnknownKeys::default(),
        })
    }

    /// Keep undeclared fields in accepted values.
    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    /// Schema title, `$id`, or file name, whichever was available.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Wrap into a shared [`SchemaRef`].
    pub fn into_ref(self) -> SchemaRef {
        Arc::new(self)
    }

    fn check(&self, mut input: Value) -> ValidationOutcome {
        let issues: Vec<Issue> = self
            .validator
            .iter_errors(&input)
            .map(|err| Issue {
                message: err.to_string(),
                path: Some(decode_pointer(&err.instance_path.to_string(), &input)),
            })
            .collect();

        if !issues.is_empty() {
            tracing::debug!(
                schema = %self.name,
                count = issues.len(),
                "json schema rejected value"
            );
            return ValidationOutcome::failure(issues);
        }

        if self.unknown_keys == UnknownKeys::Strip {
            strip_unknown(&mut input, &self.document, &self.external);
        }
        ValidationOutcome::success(input)
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("name", &self.name)
            .field("unknown_keys", &self.unknown_keys)
            .field("external", &self.external.len())
            .finish_non_exhaustive()
    }
}

impl StandardSchema for JsonSchema {
    fn vendor(&self) -> &str {
        VENDOR
    }

    fn validate(&self, input: Value) -> Validation {
        Validation::Ready(self.check(input))
    }

    fn json_schema(&self) -> Option<Value> {
        Some(self.document.clone())
    }
}

/// Decode a JSON Pointer into path items, walking `instance` to tell array
/// indices apart from object keys that happen to be numeric.
fn decode_pointer(pointer: &str, instance: &Value) -> Vec<PathItem> {
    let mut current = Some(instance);
    pointer
        .split('/')
        .skip(1)
        .map(|raw| {
            let token = raw.replace("~1", "/").replace("~0", "~");
            let key = match current {
                Some(Value::Array(items)) => match token.parse::<usize>() {
                    Ok(idx) => {
                        current = items.get(idx);
                        PropertyKey::from(idx)
                    }
                    Err(_) => {
                        current = None;
                        PropertyKey::Name(token)
                    }
                },
                Some(Value::Object(fields)) => {
                    current = fields.get(&token);
                    PropertyKey::Name(token)
                }
                _ => PropertyKey::Name(token),
            };
            PathItem::Key(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> JsonSchema {
        JsonSchema::new(json!({
            "title": "User",
            "type": "object",
            "properties": {
                "id": {"type": "integer", "minimum": 1},
                "name": {"type": "string", "minLength": 1},
                "roles": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["id", "name"]
        }))
        .unwrap()
    }

    #[test]
    fn accepts_and_strips() {
        let schema = user_schema();
        let outcome = schema.check(json!({"id": 3, "name": "ada", "password": "x"}));
        assert_eq!(outcome, ValidationOutcome::success(json!({"id": 3, "name": "ada"})));
    }

    #[test]
    fn passthrough_keeps_unknown_fields() {
        let schema = user_schema().passthrough();
        let outcome = schema.check(json!({"id": 3, "name": "ada", "password": "x"}));
        assert_eq!(
            outcome,
            ValidationOutcome::success(json!({"id": 3, "name": "ada", "password": "x"}))
        );
    }

    #[test]
    fn reports_every_violation_with_paths() {
        let schema = user_schema();
        let outcome = schema.check(json!({"id": 0, "name": "", "roles": ["ok", 5]}));
        let issues = outcome.issues().unwrap();
        assert_eq!(issues.len(), 3);

        let mut paths: Vec<String> = issues.iter().map(Issue::dotted_path).collect();
        paths.sort();
        assert_eq!(paths, vec!["id", "name", "roles.1"]);
        assert!(issues
            .iter()
            .any(|i| i.flat_path() == vec![PropertyKey::from("roles"), PropertyKey::Index(1)]));
    }

    #[test]
    fn missing_required_field_is_reported_at_root() {
        let outcome = user_schema().check(json!({"id": 1}));
        let issues = outcome.issues().unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].flat_path().is_empty());
        assert!(issues[0].message.contains("name"));
    }

    #[test]
    fn numeric_object_keys_stay_names() {
        let instance = json!({"2024": {"total": 1}});
        let path = decode_pointer("/2024/total", &instance);
        assert_eq!(
            path,
            vec![PathItem::Key("2024".into()), PathItem::Key("total".into())]
        );
    }

    #[test]
    fn escaped_pointer_tokens() {
        let instance = json!({"a/b": {"c~d": 1}});
        let path = decode_pointer("/a~1b/c~0d", &instance);
        assert_eq!(
            path,
            vec![PathItem::Key("a/b".into()), PathItem::Key("c~d".into())]
        );
    }

    #[test]
    fn invalid_schema_fails_to_compile() {
        let err = JsonSchema::new(json!({"type": 12})).unwrap_err();
        assert!(matches!(err, SchemaBuildError::Compile { .. }));
    }

    #[test]
    fn exports_document_and_vendor() {
        let schema = user_schema();
        assert_eq!(schema.vendor(), VENDOR);
        assert_eq!(schema.name(), "User");
        assert_eq!(schema.json_schema().as_ref(), Some(schema.document()));
    }
}
