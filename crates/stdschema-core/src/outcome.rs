//! # Validation Outcome
//!
//! The tagged result of one validation call: the coerced value on success,
//! or the ordered list of issues on failure. Produced once per call and
//! consumed immediately by the pipe or serializer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::issue::Issue;

/// Result of invoking a schema's validation entry point.
///
/// Serializes to the wire shapes `{ "value": … }` and `{ "issues": […] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationOutcome {
    /// The input conformed; `value` is what the schema produced from it.
    Success { value: Value },
    /// The input was rejected. An empty list still counts as a rejection.
    Failure { issues: Vec<Issue> },
}

impl ValidationOutcome {
    pub fn success(value: Value) -> Self {
        Self::Success { value }
    }

    pub fn failure(issues: Vec<Issue>) -> Self {
        Self::Failure { issues }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The reported issues, or `None` on success.
    pub fn issues(&self) -> Option<&[Issue]> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { issues } => Some(issues),
        }
    }

    pub fn into_result(self) -> Result<Value, Vec<Issue>> {
        match self {
            Self::Success { value } => Ok(value),
            Self::Failure { issues } => Err(issues),
        }
    }
}

impl From<Result<Value, Vec<Issue>>> for ValidationOutcome {
    fn from(result: Result<Value, Vec<Issue>>) -> Self {
        match result {
            Ok(value) => Self::Success { value },
            Err(issues) => Self::Failure { issues },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shapes() {
        let ok = ValidationOutcome::success(json!({"id": 1}));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"value": {"id": 1}}));

        let bad = ValidationOutcome::failure(vec![Issue::at("required", ["id"])]);
        assert_eq!(
            serde_json::to_value(&bad).unwrap(),
            json!({"issues": [{"message": "required", "path": ["id"]}]})
        );
    }

    #[test]
    fn deserializes_either_branch() {
        let ok: ValidationOutcome = serde_json::from_value(json!({"value": "x"})).unwrap();
        assert!(ok.is_success());

        let bad: ValidationOutcome =
            serde_json::from_value(json!({"issues": [{"message": "m"}]})).unwrap();
        assert_eq!(bad.issues().map(<[Issue]>::len), Some(1));
    }

    #[test]
    fn empty_issue_list_is_still_failure() {
        let outcome = ValidationOutcome::failure(Vec::new());
        assert!(!outcome.is_success());
        assert_eq!(outcome.into_result(), Err(Vec::new()));
    }
}
