//! # Unknown-Field Stripping
//!
//! Walks an accepted value alongside its schema and removes object fields the
//! schema does not declare. Runs only after validation succeeded, so it never
//! has to cope with values of the wrong type.
//!
//! The schema describing a node is the node's own subschema together with
//! everything reachable through `$ref` and `allOf`. Declared properties are
//! the union over all of them, so a `$ref` next to sibling `properties`
//! contributes its fields too.
//!
//! An object node keeps all of its fields when its schema:
//! - declares no `properties` at all (free-form object),
//! - sets `additionalProperties` to `true` or to a subschema,
//! - uses `patternProperties`, `anyOf` or `oneOf` (the matching branch is not
//!   known here).
//!
//! `$ref`s resolve inside the current document (`#/...`) or against the
//! `external` documents, looked up by full URI and then by filename. A
//! reference that resolves nowhere contributes nothing.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

/// Guard against self-referential schemas.
const MAX_DEPTH: usize = 64;

/// Remove undeclared object fields from `value`, recursively.
///
/// `document` is the schema the value was validated against; `external`
/// holds the other documents its `$ref`s may point into, keyed by `$id` or
/// filename.
pub fn strip_unknown(value: &mut Value, document: &Value, external: &HashMap<String, Value>) {
    let stripper = Stripper { external };
    let seed = Node {
        schema: document,
        root: document,
    };
    stripper.strip_node(value, &[seed], 0);
}

/// A subschema plus the document its local `$ref`s resolve against.
#[derive(Debug, Clone, Copy)]
struct Node<'a> {
    schema: &'a Value,
    root: &'a Value,
}

struct Stripper<'a> {
    external: &'a HashMap<String, Value>,
}

impl<'a> Stripper<'a> {
    fn strip_node(&self, value: &mut Value, seeds: &[Node<'a>], depth: usize) {
        if depth > MAX_DEPTH {
            return;
        }
        let mut facets = Vec::new();
        for seed in seeds {
            self.collect_facets(*seed, &mut facets, depth);
        }

        match value {
            Value::Object(fields) => self.strip_object(fields, &facets, depth),
            Value::Array(items) => self.strip_array(items, &facets, depth),
            _ => {}
        }
    }

    fn strip_object(&self, fields: &mut Map<String, Value>, facets: &[Node<'a>], depth: usize) {
        if facets
            .iter()
            .any(|f| f.schema.get("anyOf").is_some() || f.schema.get("oneOf").is_some())
        {
            return;
        }

        let mut declared: BTreeMap<&'a str, Vec<Node<'a>>> = BTreeMap::new();
        for facet in facets {
            if let Some(properties) = facet.schema.get("properties").and_then(Value::as_object) {
                for (name, sub) in properties {
                    declared.entry(name.as_str()).or_default().push(Node {
                        schema: sub,
                        root: facet.root,
                    });
                }
            }
        }

        if !keeps_unknown(facets, &declared) {
            fields.retain(|name, _| declared.contains_key(name.as_str()));
        }

        for (name, field) in fields.iter_mut() {
            if let Some(subs) = declared.get(name.as_str()) {
                self.strip_node(field, subs, depth + 1);
            }
        }
    }

    fn strip_array(&self, items: &mut [Value], facets: &[Node<'a>], depth: usize) {
        for (idx, item) in items.iter_mut().enumerate() {
            let subs: Vec<Node<'a>> = facets
                .iter()
                .filter_map(|facet| {
                    let positional = facet
                        .schema
                        .get("prefixItems")
                        .and_then(Value::as_array)
                        .and_then(|prefix| prefix.get(idx));
                    let rest = facet.schema.get("items").filter(|s| s.is_object());
                    positional.or(rest).map(|schema| Node {
                        schema,
                        root: facet.root,
                    })
                })
                .collect();
            if !subs.is_empty() {
                self.strip_node(item, &subs, depth + 1);
            }
        }
    }

    /// Push `node` and every subschema reachable from it through `$ref` and
    /// `allOf`. Each subschema is visited once.
    fn collect_facets(&self, node: Node<'a>, into: &mut Vec<Node<'a>>, depth: usize) {
        if depth > MAX_DEPTH || into.iter().any(|f| std::ptr::eq(f.schema, node.schema)) {
            return;
        }
        into.push(node);

        if let Some(reference) = node.schema.get("$ref").and_then(Value::as_str) {
            match self.target(reference, node.root) {
                Some(target) => self.collect_facets(target, into, depth + 1),
                None => tracing::debug!(reference, "unresolved $ref while stripping"),
            }
        }
        if let Some(members) = node.schema.get("allOf").and_then(Value::as_array) {
            for member in members {
                let member = Node {
                    schema: member,
                    root: node.root,
                };
                self.collect_facets(member, into, depth + 1);
            }
        }
    }

    fn target(&self, reference: &str, root: &'a Value) -> Option<Node<'a>> {
        let (base, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        let root = if base.is_empty() {
            root
        } else {
            self.document(base)?
        };
        let schema = if fragment.is_empty() {
            root
        } else {
            root.pointer(fragment)?
        };
        Some(Node { schema, root })
    }

    fn document(&self, uri: &str) -> Option<&'a Value> {
        self.external.get(uri).or_else(|| {
            let filename = uri.rsplit('/').next()?;
            self.external.get(filename)
        })
    }
}

fn keeps_unknown(facets: &[Node<'_>], declared: &BTreeMap<&str, Vec<Node<'_>>>) -> bool {
    if declared.is_empty() {
        return true;
    }
    facets.iter().any(|facet| {
        facet.schema.get("patternProperties").is_some()
            || matches!(
                facet.schema.get("additionalProperties"),
                Some(Value::Bool(true)) | Some(Value::Object(_))
            )
    })
}
