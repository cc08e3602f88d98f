//! # Documentation Metadata
//!
//! Per-field documentation attributes attached to DTOs and consumed by the
//! OpenAPI bridge. Attributes come from two places: explicit metadata passed
//! to the DTO factory, and a schema's own JSON-Schema export. Explicit values
//! win field by field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Documentation attributes for one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDoc {
    /// JSON type name (`string`, `integer`, `number`, `boolean`, `array`, `object`).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Element documentation for array fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDoc>>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
}

/// Field name → documentation attributes, in field-name order.
pub type FieldDocs = BTreeMap<String, FieldDoc>;

impl FieldDoc {
    pub fn typed(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: Some(schema_type.into()),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Overlay `explicit` on top of `self`. Set attributes in `explicit`
    /// replace derived ones; `required` and `nullable` are or-ed.
    pub fn merged(self, explicit: &FieldDoc) -> Self {
        Self {
            schema_type: pick(self.schema_type, &explicit.schema_type),
            format: pick(self.format, &explicit.format),
            description: pick(self.description, &explicit.description),
            minimum: explicit.minimum.or(self.minimum),
            maximum: explicit.maximum.or(self.maximum),
            min_length: explicit.min_length.or(self.min_length),
            max_length: explicit.max_length.or(self.max_length),
            pattern: pick(self.pattern, &explicit.pattern),
            enum_values: pick(self.enum_values, &explicit.enum_values),
            example: pick(self.example, &explicit.example),
            items: pick(self.items, &explicit.items),
            required: self.required || explicit.required,
            nullable: self.nullable || explicit.nullable,
        }
    }

    /// Render as a JSON-Schema (2020-12) property object. `required` is left
    /// out since it belongs to the parent; `nullable` becomes a `null` type.
    pub fn to_json_schema(&self) -> Value {
        let mut out = Map::new();
        match (&self.schema_type, self.nullable) {
            (Some(t), true) => {
                out.insert("type".into(), serde_json::json!([t, "null"]));
            }
            (Some(t), false) => {
                out.insert("type".into(), Value::String(t.clone()));
            }
            (None, _) => {}
        }
        if let Some(f) = &self.format {
            out.insert("format".into(), Value::String(f.clone()));
        }
        if let Some(d) = &self.description {
            out.insert("description".into(), Value::String(d.clone()));
        }
        if let Some(n) = self.minimum.and_then(serde_json::Number::from_f64) {
            out.insert("minimum".into(), Value::Number(n));
        }
        if let Some(n) = self.maximum.and_then(serde_json::Number::from_f64) {
            out.insert("maximum".into(), Value::Number(n));
        }
        if let Some(n) = self.min_length {
            out.insert("minLength".into(), Value::from(n));
        }
        if let Some(n) = self.max_length {
            out.insert("maxLength".into(), Value::from(n));
        }
        if let Some(p) = &self.pattern {
            out.insert("pattern".into(), Value::String(p.clone()));
        }
        if let Some(values) = &self.enum_values {
            out.insert("enum".into(), Value::Array(values.clone()));
        }
        if let Some(example) = &self.example {
            out.insert("examples".into(), Value::Array(vec![example.clone()]));
        }
        if let Some(items) = &self.items {
            out.insert("items".into(), items.to_json_schema());
        }
        Value::Object(out)
    }

    /// Read the documentation attributes of one JSON-Schema property.
    fn from_property(property: &Value) -> Self {
        let (schema_type, nullable) = match property.get("type") {
            Some(Value::String(t)) => (Some(t.clone()), false),
            Some(Value::Array(types)) => {
                let nullable = types.iter().any(|t| t == "null");
                let first = types
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|t| *t != "null")
                    .map(str::to_string);
                (first, nullable)
            }
            _ => (None, false),
        };
        let string = |key: &str| property.get(key).and_then(Value::as_str).map(str::to_string);
        let example = property.get("example").cloned().or_else(|| {
            property
                .get("examples")
                .and_then(Value::as_array)
                .and_then(|examples| examples.first().cloned())
        });

        Self {
            schema_type,
            format: string("format"),
            description: string("description"),
            minimum: property.get("minimum").and_then(Value::as_f64),
            maximum: property.get("maximum").and_then(Value::as_f64),
            min_length: property.get("minLength").and_then(Value::as_u64),
            max_length: property.get("maxLength").and_then(Value::as_u64),
            pattern: string("pattern"),
            enum_values: property.get("enum").and_then(Value::as_array).cloned(),
            example,
            items: property
                .get("items")
                .filter(|items| items.is_object())
                .map(|items| Box::new(Self::from_property(items))),
            required: false,
            nullable: nullable || property.get("nullable") == Some(&Value::Bool(true)),
        }
    }
}

fn pick<T: Clone>(derived: Option<T>, explicit: &Option<T>) -> Option<T> {
    explicit.clone().or(derived)
}

/// Derive per-field documentation from an object-shaped JSON Schema.
///
/// Returns `None` when the schema has no `properties` to describe.
pub fn derive_field_docs(json_schema: &Value) -> Option<FieldDocs> {
    let properties = json_schema.get("properties")?.as_object()?;
    let required: Vec<&str> = json_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    Some(
        properties
            .iter()
            .map(|(name, property)| {
                let mut doc = FieldDoc::from_property(property);
                doc.required = required.contains(&name.as_str());
                (name.clone(), doc)
            })
            .collect(),
    )
}

/// Merge explicit per-field metadata over derived metadata. Fields present
/// only in `explicit` are added.
pub fn merge_field_docs(derived: Option<FieldDocs>, explicit: Option<&FieldDocs>) -> Option<FieldDocs> {
    match (derived, explicit) {
        (None, None) => None,
        (Some(derived), None) => Some(derived),
        (None, Some(explicit)) => Some(explicit.clone()),
        (Some(mut derived), Some(explicit)) => {
            for (name, doc) in explicit {
                let merged = match derived.remove(name) {
                    Some(base) => base.merged(doc),
                    None => doc.clone(),
                };
                derived.insert(name.clone(), merged);
            }
            Some(derived)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer", "minimum": 1},
                "email": {"type": "string", "format": "email", "examples": ["a@b.io"]},
                "nickname": {"type": ["string", "null"], "maxLength": 32},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["id", "email"]
        })
    }

    #[test]
    fn derives_fields_from_json_schema() {
        let docs = derive_field_docs(&user_schema()).unwrap();
        assert_eq!(docs.len(), 4);

        let id = &docs["id"];
        assert_eq!(id.schema_type.as_deref(), Some("integer"));
        assert_eq!(id.minimum, Some(1.0));
        assert!(id.required);

        let email = &docs["email"];
        assert_eq!(email.format.as_deref(), Some("email"));
        assert_eq!(email.example, Some(json!("a@b.io")));

        let nickname = &docs["nickname"];
        assert!(nickname.nullable);
        assert!(!nickname.required);
        assert_eq!(nickname.max_length, Some(32));

        let tags = &docs["tags"];
        assert_eq!(
            tags.items.as_ref().and_then(|i| i.schema_type.as_deref()),
            Some("string")
        );
    }

    #[test]
    fn non_object_schema_has_no_field_docs() {
        assert!(derive_field_docs(&json!({"type": "string"})).is_none());
    }

    #[test]
    fn explicit_metadata_wins_per_attribute() {
        let derived = derive_field_docs(&user_schema());
        let mut explicit = FieldDocs::new();
        explicit.insert(
            "email".into(),
            FieldDoc::default().example(json!("ops@example.com")),
        );
        explicit.insert("extra".into(), FieldDoc::typed("boolean"));

        let merged = merge_field_docs(derived, Some(&explicit)).unwrap();
        let email = &merged["email"];
        assert_eq!(email.example, Some(json!("ops@example.com")));
        assert_eq!(email.format.as_deref(), Some("email"));
        assert!(email.required);
        assert_eq!(merged["extra"].schema_type.as_deref(), Some("boolean"));
    }

    #[test]
    fn renders_back_to_json_schema() {
        let doc = FieldDoc::typed("string")
            .format("uuid")
            .description("primary key")
            .required();
        assert_eq!(
            doc.to_json_schema(),
            json!({"type": "string", "format": "uuid", "description": "primary key"})
        );
    }

    #[test]
    fn nullable_and_example_render_as_2020_12_keywords() {
        let mut doc = FieldDoc::typed("integer").example(json!(7));
        doc.nullable = true;
        assert_eq!(
            doc.to_json_schema(),
            json!({"type": ["integer", "null"], "examples": [7]})
        );
    }
}
