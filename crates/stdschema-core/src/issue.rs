//! # Validation Issues
//!
//! An [`Issue`] is one reported validation failure: a human-readable message
//! plus an optional path into the validated value. Path entries are either
//! raw property keys or segment descriptors wrapping a key, because vendors
//! disagree on which one they emit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single property key: an object field name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyKey {
    /// Array index.
    Index(u64),
    /// Object field name.
    Name(String),
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => f.write_str(n),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<u64> for PropertyKey {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<usize> for PropertyKey {
    fn from(index: usize) -> Self {
        Self::Index(index as u64)
    }
}

/// A compound path-segment descriptor. Only `key` is meaningful to stdschema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub key: PropertyKey,
}

impl PathSegment {
    pub fn new(key: impl Into<PropertyKey>) -> Self {
        Self { key: key.into() }
    }
}

/// One entry of an issue path, as emitted by the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathItem {
    Key(PropertyKey),
    Segment(PathSegment),
}

impl PathItem {
    /// The property key this entry designates, whichever form it came in.
    pub fn key(&self) -> &PropertyKey {
        match self {
            Self::Key(k) => k,
            Self::Segment(s) => &s.key,
        }
    }
}

impl From<PropertyKey> for PathItem {
    fn from(key: PropertyKey) -> Self {
        Self::Key(key)
    }
}

impl From<PathSegment> for PathItem {
    fn from(segment: PathSegment) -> Self {
        Self::Segment(segment)
    }
}

impl From<&str> for PathItem {
    fn from(name: &str) -> Self {
        Self::Key(name.into())
    }
}

impl From<usize> for PathItem {
    fn from(index: usize) -> Self {
        Self::Key(index.into())
    }
}

/// One validation failure reported by a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Human-readable description of the failure.
    pub message: String,
    /// Location of the failure inside the validated value, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathItem>>,
}

impl Issue {
    /// An issue with no path (applies to the value as a whole).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// An issue located at `path`.
    pub fn at<I, P>(message: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathItem>,
    {
        Self {
            message: message.into(),
            path: Some(path.into_iter().map(Into::into).collect()),
        }
    }

    /// The path reduced to plain property keys. Segment descriptors
    /// contribute their `key`; a missing path yields an empty vector.
    pub fn flat_path(&self) -> Vec<PropertyKey> {
        self.path
            .iter()
            .flatten()
            .map(|item| item.key().clone())
            .collect()
    }

    /// Dotted rendering of the path for log lines, e.g. `address.lines.0`.
    pub fn dotted_path(&self) -> String {
        self.flat_path()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.dotted_path();
        if path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{path}: {}", self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_path_mixes_keys_and_segments() {
        let issue = Issue {
            message: "too short".into(),
            path: Some(vec![
                PathItem::from("address"),
                PathItem::Segment(PathSegment::new("lines")),
                PathItem::from(2usize),
            ]),
        };
        assert_eq!(
            issue.flat_path(),
            vec![
                PropertyKey::from("address"),
                PropertyKey::from("lines"),
                PropertyKey::Index(2),
            ]
        );
        assert_eq!(issue.dotted_path(), "address.lines.2");
    }

    #[test]
    fn missing_path_flattens_to_empty() {
        let issue = Issue::new("expected object");
        assert!(issue.flat_path().is_empty());
        assert_eq!(issue.to_string(), "(root): expected object");
    }

    #[test]
    fn path_items_deserialize_from_vendor_shapes() {
        let issue: Issue = serde_json::from_value(json!({
            "message": "bad",
            "path": ["items", {"key": 0}, "name"]
        }))
        .unwrap();
        assert_eq!(issue.dotted_path(), "items.0.name");
        assert!(matches!(
            issue.path.as_deref(),
            Some([PathItem::Key(_), PathItem::Segment(_), PathItem::Key(_)])
        ));
    }

    #[test]
    fn serialization_omits_absent_path() {
        let json = serde_json::to_value(Issue::new("nope")).unwrap();
        assert_eq!(json, json!({"message": "nope"}));
    }
}
