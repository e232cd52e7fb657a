//! Fragment containment.
//!
//! The document is serialized in its recursive value-sorted form. Each pair
//! of the (also sorted) fragment is serialized as `"key":value` and searched
//! for as a substring that is immediately followed by `]`, `}` or `,`, the
//! only characters that can end a member in the compact serialization.
//!
//! This is a textual search: a pair matches at any nesting level, and a pair
//! can match a peer of a different parent if their serializations coincide.

use serde_json::{Map, Value};

use super::canonical::{similar_form, sort_recursive};
use crate::error::{AssertResult, AssertionError};

const MEMBER_TERMINATORS: [char; 3] = [']', '}', ','];

/// Returns true if every pair of `fragment` is found in `document`.
#[must_use]
pub fn contains(document: &Value, fragment: &Value) -> bool {
    FragmentMatcher::new(document).contains(fragment)
}

/// A single searchable unit of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Needle {
    /// Serialized member text, without terminator.
    text: String,
    /// The pair as a standalone document, for failure messages.
    display: String,
}

/// Searches a canonicalized document for fragments.
///
/// The document is canonicalized once and reused for every search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentMatcher {
    haystack: String,
}

impl FragmentMatcher {
    /// Canonicalizes `document` for searching.
    #[must_use]
    pub fn new(document: &Value) -> Self {
        Self {
            haystack: similar_form(document),
        }
    }

    /// The canonical serialization that fragments are searched in.
    #[must_use]
    pub fn haystack(&self) -> &str {
        &self.haystack
    }

    /// Returns true if every pair of `fragment` is present.
    #[must_use]
    pub fn contains(&self, fragment: &Value) -> bool {
        needles(fragment).iter().all(|n| self.finds(n))
    }

    /// Fails on the first fragment pair that is not present.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::FragmentNotFound`] naming the missing pair.
    pub fn assert_contains(&self, fragment: &Value) -> AssertResult<()> {
        match needles(fragment).into_iter().find(|n| !self.finds(n)) {
            Some(needle) => Err(AssertionError::FragmentNotFound {
                fragment: needle.display,
                haystack: self.haystack.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Asserts that `fragment` is absent.
    ///
    /// With `exact`, delegates to [`Self::assert_missing_exact`]. Otherwise
    /// fails as soon as any single pair is found.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::UnexpectedFragmentFound`].
    pub fn assert_missing(&self, fragment: &Value, exact: bool) -> AssertResult<()> {
        if exact {
            return self.assert_missing_exact(fragment);
        }

        match needles(fragment).into_iter().find(|n| self.finds(n)) {
            Some(needle) => Err(AssertionError::UnexpectedFragmentFound {
                fragment: needle.display,
                haystack: self.haystack.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Asserts that `fragment` is not present as a whole.
    ///
    /// Passes if at least one pair is absent; fails only when every pair is
    /// found.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::UnexpectedFragmentFound`] naming the whole
    /// fragment.
    pub fn assert_missing_exact(&self, fragment: &Value) -> AssertResult<()> {
        if needles(fragment).iter().any(|n| !self.finds(n)) {
            return Ok(());
        }

        Err(AssertionError::UnexpectedFragmentFound {
            fragment: fragment.to_string(),
            haystack: self.haystack.clone(),
        })
    }

    fn finds(&self, needle: &Needle) -> bool {
        MEMBER_TERMINATORS.iter().any(|terminator| {
            let mut candidate = String::with_capacity(needle.text.len() + 1);
            candidate.push_str(&needle.text);
            candidate.push(*terminator);
            self.haystack.contains(&candidate)
        })
    }
}

// Objects contribute one needle per member, arrays one per element, a
// scalar fragment is a single needle.
fn needles(fragment: &Value) -> Vec<Needle> {
    match sort_recursive(fragment) {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| {
                let mut pair = Map::new();
                pair.insert(key, value);
                let display = Value::Object(pair).to_string();
                let text = strip_outer(&display).to_owned();
                Needle { text, display }
            })
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                let text = item.to_string();
                Needle {
                    display: format!("[{text}]"),
                    text,
                }
            })
            .collect(),
        scalar => {
            let text = scalar.to_string();
            vec![Needle {
                display: text.clone(),
                text,
            }]
        }
    }
}

fn strip_outer(encoded: &str) -> &str {
    encoded
        .strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(encoded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_nested_fragment_found() {
        let doc = json!({"id": 1, "name": {"first": "Jo"}});
        assert!(contains(&doc, &json!({"name": {"first": "Jo"}})));
        assert!(!contains(&doc, &json!({"name": {"first": "Jon"}})));
    }

    #[test]
    fn test_fragment_found_at_any_depth() {
        let doc = json!({"data": [{"user": {"id": 7, "role": "admin"}}]});
        assert!(contains(&doc, &json!({"role": "admin"})));
        assert!(contains(&doc, &json!({"id": 7, "role": "admin"})));
    }

    #[test]
    fn test_value_prefix_does_not_match() {
        let doc = json!({"count": 12});
        assert!(!contains(&doc, &json!({"count": 1})));
    }

    #[test]
    fn test_key_suffix_does_not_match() {
        let doc = json!({"uid": 1});
        assert!(!contains(&doc, &json!({"id": 1})));
    }

    #[test]
    fn test_pair_may_match_at_another_level() {
        // Textual search: the nested `"id":1}` satisfies a top-level lookup.
        let doc = json!({"outer": {"id": 1}, "id": 2});
        assert!(contains(&doc, &json!({"id": 1})));
        assert!(FragmentMatcher::new(&doc).assert_missing(&json!({"id": 1}), false).is_err());
    }

    #[test]
    fn test_array_order_is_ignored() {
        let doc = json!({"tags": ["b", "a"]});
        assert!(contains(&doc, &json!({"tags": ["a", "b"]})));
    }

    #[test]
    fn test_array_fragment_matches_elements() {
        let doc = json!({"ids": [3, 1, 2]});
        assert!(contains(&doc, &json!([1, 2])));
        assert!(!contains(&doc, &json!([4])));
    }

    #[test]
    fn test_assert_contains_reports_missing_pair() {
        let matcher = FragmentMatcher::new(&json!({"a": 1, "b": 2}));
        let err = matcher
            .assert_contains(&json!({"a": 1, "b": 3}))
            .unwrap_err();
        assert_eq!(
            err,
            AssertionError::FragmentNotFound {
                fragment: r#"{"b":3}"#.to_string(),
                haystack: r#"{"a":1,"b":2}"#.to_string(),
            }
        );
    }

    #[test]
    fn test_assert_missing_fails_on_any_pair() {
        let matcher = FragmentMatcher::new(&json!({"a": 1, "b": 2}));
        assert!(matcher.assert_missing(&json!({"a": 1, "b": 9}), false).is_err());
        assert!(matcher.assert_missing(&json!({"c": 1}), false).is_ok());
    }

    #[test]
    fn test_assert_missing_exact_needs_every_pair() {
        let matcher = FragmentMatcher::new(&json!({"a": 1, "b": 2}));
        assert!(matcher.assert_missing_exact(&json!({"a": 1, "b": 9})).is_ok());
        assert!(matcher.assert_missing(&json!({"a": 1, "b": 9}), true).is_ok());

        let err = matcher
            .assert_missing_exact(&json!({"a": 1, "b": 2}))
            .unwrap_err();
        assert!(matches!(err, AssertionError::UnexpectedFragmentFound { .. }));
    }

    #[test]
    fn test_haystack_is_canonical() {
        let matcher = FragmentMatcher::new(&json!({"b": [2, 1], "a": null}));
        assert_eq!(matcher.haystack(), r#"{"a":null,"b":[1,2]}"#);
    }
}
