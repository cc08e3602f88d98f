//! # A hand-written vendor through the contract
//!
//! Implements [`StandardSchema`] directly, the way a third-party validation
//! library would, and checks that DTOs and the registry treat it like any
//! other schema.

use std::sync::Arc;

use serde_json::{json, Value};
use stdschema_core::{
    create_standard_dto, same_schema, DtoOptions, HandlerKey, Issue, MetadataRegistry, Metatype,
    PathItem, PathSegment, PropertyKey, SchemaRef, StandardSchema, Validation, ValidationOutcome,
    STANDARD_VERSION,
};

/// Requires a non-empty `tags` array of strings; resolves asynchronously and
/// reports paths with segment descriptors.
#[derive(Debug)]
struct TagsSchema;

impl StandardSchema for TagsSchema {
    fn vendor(&self) -> &str {
        "tags"
    }

    fn validate(&self, input: Value) -> Validation {
        Validation::Pending(Box::pin(async move {
            let Some(tags) = input.get("tags").and_then(Value::as_array) else {
                return ValidationOutcome::failure(vec![Issue::new("expected object with tags")]);
            };
            let issues: Vec<Issue> = tags
                .iter()
                .enumerate()
                .filter(|(_, tag)| !tag.is_string())
                .map(|(i, _)| Issue {
                    message: "expected string".into(),
                    path: Some(vec![
                        PathItem::Segment(PathSegment::new("tags")),
                        PathItem::Segment(PathSegment::new(i)),
                    ]),
                })
                .collect();
            if issues.is_empty() {
                ValidationOutcome::success(json!({ "tags": tags }))
            } else {
                ValidationOutcome::failure(issues)
            }
        }))
    }
}

struct Article;

#[tokio::test]
async fn pending_outcomes_resolve_through_the_contract() {
    let schema: SchemaRef = Arc::new(TagsSchema);
    assert_eq!(schema.version(), STANDARD_VERSION);

    let validation = schema.validate(json!({"tags": ["a"], "draft": true}));
    assert!(validation.is_pending());
    assert_eq!(
        validation.resolve().await,
        ValidationOutcome::success(json!({"tags": ["a"]}))
    );

    let issues = schema
        .validate(json!({"tags": ["a", 1, "b", null]}))
        .resolve()
        .await
        .into_result()
        .unwrap_err();
    let paths: Vec<Vec<PropertyKey>> = issues.iter().map(Issue::flat_path).collect();
    assert_eq!(
        paths,
        vec![
            vec![PropertyKey::from("tags"), PropertyKey::Index(1)],
            vec![PropertyKey::from("tags"), PropertyKey::Index(3)],
        ]
    );
}

#[test]
fn custom_vendors_register_like_any_schema() {
    let schema: SchemaRef = Arc::new(TagsSchema);
    let dto = create_standard_dto::<Article>(Arc::clone(&schema), DtoOptions::default());
    assert_eq!(dto.name(), "Article");
    assert!(dto.openapi_metadata().is_none());

    let registry = MetadataRegistry::new();
    registry.register_dto(&dto);
    registry.attach_response(HandlerKey::new("GET", "/articles"), [dto]);

    let found = registry
        .static_schema_for(&Metatype::of::<Article>())
        .unwrap();
    assert!(same_schema(&found, &schema));
    assert!(registry
        .response_for(&HandlerKey::new("GET", "/articles"))
        .unwrap()
        .is_array());
}
