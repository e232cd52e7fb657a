//! Assertions over a decoded JSON document.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::path::Path;

use hitest_domain::json::{
    self, FragmentMatcher, StructureSpec, diff, exact_form, remove_keys, similar_form, type_name,
};
use hitest_domain::{AssertResult, AssertionError};
use serde_json::Value;
use tracing::debug;

use super::{ensure, logged};

/// Fluent assertions over one JSON document.
///
/// Every assertion returns `Ok(&self)` on success so checks chain with `?`.
/// The document is never mutated.
#[derive(Debug, Clone)]
pub struct JsonAssert {
    data: Value,
    matcher: OnceCell<FragmentMatcher>,
}

impl JsonAssert {
    /// Wraps an already-decoded document.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data,
            matcher: OnceCell::new(),
        }
    }

    /// Strictly decodes `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::InvalidJson`] for malformed input or a
    /// document that is `null`.
    pub fn from_slice(bytes: &[u8]) -> AssertResult<Self> {
        json::decode(bytes).map(Self::new)
    }

    /// The whole document.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    fn matcher(&self) -> &FragmentMatcher {
        self.matcher.get_or_init(|| FragmentMatcher::new(&self.data))
    }

    /// Resolves `key`, or returns the whole document when `key` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::PathNotFound`] if the path does not exist.
    pub fn json(&self, key: Option<&str>) -> AssertResult<Cow<'_, Value>> {
        json::resolve(&self.data, key.unwrap_or_default())
    }

    /// Asserts that the value at `path` equals `expected`, type included.
    ///
    /// # Errors
    ///
    /// Fails if the path is missing or the value differs.
    pub fn assert_json_path(&self, path: &str, expected: &Value) -> AssertResult<&Self> {
        let actual = logged(json::resolve(&self.data, path))?;
        ensure(actual.as_ref() == expected, || {
            AssertionError::failed(
                format!("Failed asserting that the value at [{path}] matches."),
                expected.to_string(),
                actual.to_string(),
            )
        })?;
        Ok(self)
    }

    /// Asserts that the value at `path` satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Fails if the path is missing or the predicate returns false.
    pub fn assert_json_path_matches<F>(&self, path: &str, predicate: F) -> AssertResult<&Self>
    where
        F: FnOnce(&Value) -> bool,
    {
        let actual = logged(json::resolve(&self.data, path))?;
        ensure(predicate(&actual), || {
            AssertionError::failed(
                format!("The value at [{path}] did not satisfy the predicate."),
                "a value accepted by the predicate",
                actual.to_string(),
            )
        })?;
        Ok(self)
    }

    /// Asserts that the array at `path` holds the same elements as `expected`
    /// in any order.
    ///
    /// # Errors
    ///
    /// Fails if the path is missing, does not hold an array, or the element
    /// sets differ.
    pub fn assert_json_path_canonicalizing(
        &self,
        path: &str,
        expected: &[Value],
    ) -> AssertResult<&Self> {
        let actual = logged(json::resolve(&self.data, path))?;
        ensure(actual.is_array(), || {
            AssertionError::failed(
                format!("Failed asserting that the value at [{path}] is an array."),
                "array",
                type_name(&actual),
            )
        })?;
        let actual = actual.into_owned();
        let expected = Value::Array(expected.to_vec());
        let (expected_form, actual_form) = (similar_form(&expected), similar_form(&actual));
        ensure(expected_form == actual_form, || {
            AssertionError::failed(
                format!("Failed asserting that the values at [{path}] match in any order."),
                expected_form.clone(),
                actual_form.clone(),
            )
        })?;
        Ok(self)
    }

    /// Asserts exact equality: key order is ignored, array order is not.
    ///
    /// # Errors
    ///
    /// Fails with both canonical forms when the documents differ.
    pub fn assert_exact_json(&self, expected: &Value) -> AssertResult<&Self> {
        let (expected_form, actual_form) = (exact_form(expected), exact_form(&self.data));
        ensure(expected_form == actual_form, || {
            AssertionError::failed(
                "Failed asserting that the JSON is exactly equal.",
                expected_form.clone(),
                actual_form.clone(),
            )
        })?;
        Ok(self)
    }

    /// Asserts equality ignoring both key order and array order.
    ///
    /// # Errors
    ///
    /// Fails with both canonical forms when the documents differ.
    pub fn assert_similar_json(&self, expected: &Value) -> AssertResult<&Self> {
        let (expected_form, actual_form) = (similar_form(expected), similar_form(&self.data));
        ensure(expected_form == actual_form, || {
            AssertionError::failed(
                "Failed asserting that the JSON is similar.",
                expected_form.clone(),
                actual_form.clone(),
            )
        })?;
        Ok(self)
    }

    /// Asserts that every pair of `fragment` appears somewhere in the document.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::FragmentNotFound`] for the first missing pair.
    pub fn assert_json_fragment(&self, fragment: &Value) -> AssertResult<&Self> {
        logged(self.matcher().assert_contains(fragment))?;
        Ok(self)
    }

    /// Asserts that `fragment` is absent.
    ///
    /// Without `exact`, any single pair being present fails. With `exact`,
    /// only the whole fragment being present fails.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::UnexpectedFragmentFound`].
    pub fn assert_json_missing(&self, fragment: &Value, exact: bool) -> AssertResult<&Self> {
        logged(self.matcher().assert_missing(fragment, exact))?;
        Ok(self)
    }

    /// Asserts that `fragment` is not present as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::UnexpectedFragmentFound`] when every pair is
    /// found.
    pub fn assert_json_missing_exact(&self, fragment: &Value) -> AssertResult<&Self> {
        logged(self.matcher().assert_missing_exact(fragment))?;
        Ok(self)
    }

    /// Asserts that `path` does not resolve.
    ///
    /// # Errors
    ///
    /// Fails if the path exists, even when its value is `null`.
    pub fn assert_json_missing_path(&self, path: &str) -> AssertResult<&Self> {
        match json::resolve(&self.data, path) {
            Err(err) if err.is_path_not_found() => Ok(self),
            Err(err) => logged(Err(err)),
            Ok(found) => logged(Err(AssertionError::failed(
                format!("Found unexpected key [{path}]."),
                "(missing)",
                found.to_string(),
            ))),
        }
    }

    /// Validates the document's shape. `None` accepts any document.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::ShapeMismatch`] at the first level that fails.
    pub fn assert_json_structure(&self, structure: Option<&StructureSpec>) -> AssertResult<&Self> {
        if let Some(structure) = structure {
            logged(structure.validate(&self.data))?;
        }
        Ok(self)
    }

    /// Asserts that the value at `key` (or the document) is an array.
    ///
    /// # Errors
    ///
    /// Fails if the path is missing or holds another type.
    pub fn assert_json_is_array(&self, key: Option<&str>) -> AssertResult<&Self> {
        self.assert_type(key, "array", Value::is_array)
    }

    /// Asserts that the value at `key` (or the document) is an object.
    ///
    /// # Errors
    ///
    /// Fails if the path is missing or holds another type.
    pub fn assert_json_is_object(&self, key: Option<&str>) -> AssertResult<&Self> {
        self.assert_type(key, "object", Value::is_object)
    }

    fn assert_type(
        &self,
        key: Option<&str>,
        expected: &str,
        check: fn(&Value) -> bool,
    ) -> AssertResult<&Self> {
        let value = logged(self.json(key))?;
        ensure(check(&value), || {
            AssertionError::failed(
                format!(
                    "Failed asserting that [{}] is a JSON {expected}.",
                    key.unwrap_or("(root)")
                ),
                expected,
                type_name(&value),
            )
        })?;
        Ok(self)
    }

    /// Compares the document with `expected` after removing `keys_to_remove`
    /// from both at every depth.
    ///
    /// # Errors
    ///
    /// Fails with a unified diff of the exact canonical forms.
    pub fn assert_json_equals(&self, expected: &Value, keys_to_remove: &[&str]) -> AssertResult<&Self> {
        let expected = remove_keys(expected, keys_to_remove);
        let actual = remove_keys(&self.data, keys_to_remove);
        let (expected_form, actual_form) = (exact_form(&expected), exact_form(&actual));
        ensure(expected_form == actual_form, || {
            AssertionError::failed(
                format!(
                    "Failed asserting that two JSON documents are equal.\n{}",
                    diff::unified(&expected_form, &actual_form)
                ),
                expected.to_string(),
                actual.to_string(),
            )
        })?;
        Ok(self)
    }

    /// Like [`Self::assert_json_equals`], reading the expected document from
    /// a fixture file.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::Fixture`] if the file cannot be read or
    /// decoded, otherwise fails like [`Self::assert_json_equals`].
    pub fn assert_json_equals_file(
        &self,
        path: impl AsRef<Path>,
        keys_to_remove: &[&str],
    ) -> AssertResult<&Self> {
        let expected = logged(load_fixture(path.as_ref()))?;
        self.assert_json_equals(&expected, keys_to_remove)
    }
}

impl From<Value> for JsonAssert {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

fn load_fixture(path: &Path) -> AssertResult<Value> {
    let fixture = |reason: String| AssertionError::Fixture {
        path: path.display().to_string(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| fixture(e.to_string()))?;
    debug!(path = %path.display(), bytes = text.len(), "loaded JSON fixture");
    serde_json::from_str(&text).map_err(|e| fixture(e.to_string()))
}
