//! Shape validation.
//!
//! A [`StructureSpec`] lists what must exist at one level of a document,
//! ignoring values entirely. It is usually written as JSON:
//!
//! ```
//! use hitest_domain::json::StructureSpec;
//! use serde_json::json;
//!
//! let spec = StructureSpec::from(&json!({"data": {"*": ["id", "name"]}}));
//! let doc = json!({"data": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]});
//! assert!(spec.validate(&doc).is_ok());
//! ```
//!
//! - a scalar value names a key that must be present at this level
//! - an object or array value under a key requires that key and recurses
//! - an object or array value under the key `*` requires the current value to
//!   be an array and validates every element against it

use serde_json::Value;

use super::path::WILDCARD;
use super::{child, type_name};
use crate::error::{AssertResult, AssertionError};

/// One requirement at a single level of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureNode {
    /// The key must be present.
    Key(String),
    /// The key must be present and its value must match the nested spec.
    Nested(String, StructureSpec),
    /// The current value must be an array whose elements all match.
    Each(StructureSpec),
}

/// Shape-only description of a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructureSpec {
    nodes: Vec<StructureNode>,
}

impl StructureSpec {
    /// Creates an empty spec, which every value satisfies.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Requires a key at this level.
    #[must_use]
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.nodes.push(StructureNode::Key(name.into()));
        self
    }

    /// Requires several keys at this level.
    #[must_use]
    pub fn keys<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes
            .extend(names.into_iter().map(|n| StructureNode::Key(n.into())));
        self
    }

    /// Requires a key whose value matches `spec`.
    #[must_use]
    pub fn nested(mut self, name: impl Into<String>, spec: Self) -> Self {
        self.nodes.push(StructureNode::Nested(name.into(), spec));
        self
    }

    /// Requires the current value to be an array whose elements match `spec`.
    #[must_use]
    pub fn each(mut self, spec: Self) -> Self {
        self.nodes.push(StructureNode::Each(spec));
        self
    }

    /// The requirements of this level, in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[StructureNode] {
        &self.nodes
    }

    /// Returns true if there are no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parses a spec written as JSON.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let nodes = match value {
            Value::Object(map) => map
                .iter()
                .map(|(key, entry)| match entry {
                    Value::Object(_) | Value::Array(_) if key == WILDCARD => {
                        StructureNode::Each(Self::from_value(entry))
                    }
                    Value::Object(_) | Value::Array(_) => {
                        StructureNode::Nested(key.clone(), Self::from_value(entry))
                    }
                    scalar => StructureNode::Key(scalar_key(scalar)),
                })
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, entry)| match entry {
                    Value::Object(_) | Value::Array(_) => {
                        StructureNode::Nested(index.to_string(), Self::from_value(entry))
                    }
                    scalar => StructureNode::Key(scalar_key(scalar)),
                })
                .collect(),
            scalar => vec![StructureNode::Key(scalar_key(scalar))],
        };
        Self { nodes }
    }

    /// Validates the shape of `value`, stopping at the first mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::ShapeMismatch`] with the location of the
    /// level that failed.
    pub fn validate(&self, value: &Value) -> AssertResult<()> {
        self.validate_at(value, "")
    }

    fn validate_at(&self, value: &Value, location: &str) -> AssertResult<()> {
        for node in &self.nodes {
            match node {
                StructureNode::Key(key) => {
                    require(value, key, location)?;
                }
                StructureNode::Nested(key, spec) => {
                    let nested = require(value, key, location)?;
                    spec.validate_at(nested, &join(location, key))?;
                }
                StructureNode::Each(spec) => {
                    let Value::Array(items) = value else {
                        return Err(AssertionError::ShapeMismatch {
                            location: location.to_owned(),
                            message: format!(
                                "expected an array for [*], found {}",
                                type_name(value)
                            ),
                        });
                    };
                    for (index, item) in items.iter().enumerate() {
                        spec.validate_at(item, &join(location, &index.to_string()))?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<&Value> for StructureSpec {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

impl From<Value> for StructureSpec {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

fn require<'a>(value: &'a Value, key: &str, location: &str) -> AssertResult<&'a Value> {
    child(value, key).ok_or_else(|| AssertionError::ShapeMismatch {
        location: location.to_owned(),
        message: match value {
            Value::Object(_) | Value::Array(_) => format!("missing key [{key}]"),
            other => format!("expected key [{key}] but found {}", type_name(other)),
        },
    })
}

fn scalar_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join(location: &str, key: &str) -> String {
    if location.is_empty() {
        key.to_owned()
    } else {
        format!("{location}.{key}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data_spec() -> StructureSpec {
        StructureSpec::from(&json!({"data": {"*": ["id", "name"]}}))
    }

    #[test]
    fn test_parse_wildcard_spec() {
        let expected = StructureSpec::new().nested(
            "data",
            StructureSpec::new().each(StructureSpec::new().keys(["id", "name"])),
        );
        assert_eq!(data_spec(), expected);
    }

    #[test]
    fn test_wildcard_array_validates() {
        let doc = json!({"data": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]});
        assert!(data_spec().validate(&doc).is_ok());
    }

    #[test]
    fn test_wildcard_element_missing_key() {
        let doc = json!({"data": [{"id": 1, "name": "a"}, {"id": 2}]});
        let err = data_spec().validate(&doc).unwrap_err();
        assert_eq!(
            err,
            AssertionError::ShapeMismatch {
                location: "data.1".to_string(),
                message: "missing key [name]".to_string(),
            }
        );
    }

    #[test]
    fn test_wildcard_requires_array() {
        let doc = json!({"data": {"id": 1, "name": "a"}});
        let err = data_spec().validate(&doc).unwrap_err();
        assert!(matches!(
            err,
            AssertionError::ShapeMismatch { ref location, .. } if location == "data"
        ));
    }

    #[test]
    fn test_empty_array_satisfies_wildcard() {
        assert!(data_spec().validate(&json!({"data": []})).is_ok());
    }

    #[test]
    fn test_values_are_ignored() {
        let spec = StructureSpec::from(&json!(["id", {"meta": ["page"]}]));
        let doc = json!({"id": null, "1": {"meta": {"page": "anything"}}});
        assert!(spec.validate(&doc).is_ok());
    }

    #[test]
    fn test_nested_object_spec() {
        let spec = StructureSpec::from(&json!({"meta": {"pagination": ["total"]}}));
        assert!(spec
            .validate(&json!({"meta": {"pagination": {"total": 3}}}))
            .is_ok());

        let err = spec
            .validate(&json!({"meta": {"links": {}}}))
            .unwrap_err();
        assert_eq!(
            err,
            AssertionError::ShapeMismatch {
                location: "meta".to_string(),
                message: "missing key [pagination]".to_string(),
            }
        );
    }

    #[test]
    fn test_key_on_scalar_reports_type() {
        let spec = StructureSpec::new().nested("a", StructureSpec::new().key("b"));
        let err = spec.validate(&json!({"a": 5})).unwrap_err();
        assert_eq!(
            err,
            AssertionError::ShapeMismatch {
                location: "a".to_string(),
                message: "expected key [b] but found number".to_string(),
            }
        );
    }

    #[test]
    fn test_fail_fast_reports_first_mismatch() {
        let spec = StructureSpec::new().keys(["a", "b", "c"]);
        let err = spec.validate(&json!({"a": 1})).unwrap_err();
        assert!(err.to_string().contains("missing key [b]"));
    }

    #[test]
    fn test_top_level_array_of_items() {
        let spec = StructureSpec::from(&json!({"*": ["id"]}));
        assert!(spec.validate(&json!([{"id": 1}, {"id": 2}])).is_ok());
        assert!(spec.validate(&json!([{"id": 1}, {}])).is_err());
    }
}
