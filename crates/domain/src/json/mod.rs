//! JSON comparison engine.
//!
//! All functions operate on already-decoded [`serde_json::Value`] documents
//! and never mutate their input:
//! - [`path`] resolves dot-delimited addresses (with `*` wildcards)
//! - [`canonical`] builds the order-independent forms used for equality
//! - [`fragment`] checks partial-fragment containment
//! - [`structure`] validates the shape of a document
//! - [`prune`] strips keys before fixture comparison

pub mod canonical;
pub mod diff;
pub mod fragment;
pub mod path;
pub mod prune;
pub mod structure;

use serde_json::Value;

use crate::error::{AssertResult, AssertionError};

pub use canonical::{exact_eq, exact_form, similar_eq, similar_form, sort_keys_flat, sort_recursive};
pub use fragment::{FragmentMatcher, contains};
pub use path::{JsonPath, WILDCARD, has_path, resolve, resolve_as_array};
pub use prune::remove_keys;
pub use structure::{StructureNode, StructureSpec};

/// Strictly decodes a response body.
///
/// # Errors
///
/// Returns [`AssertionError::InvalidJson`] for malformed input or a document
/// that is `null`, with the raw body attached.
pub fn decode(bytes: &[u8]) -> AssertResult<Value> {
    let reason = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Null) => "the body decoded to null".to_string(),
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };
    Err(AssertionError::InvalidJson {
        reason,
        body: String::from_utf8_lossy(bytes).into_owned(),
    })
}

/// Returns the JSON type name of a value, for failure messages.
#[must_use]
pub const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Looks up a single segment in an object (by key) or an array (by index).
pub(crate) fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_accepts_scalars_and_containers() {
        assert_eq!(decode(b"[1, 2]").unwrap(), json!([1, 2]));
        assert_eq!(decode(b"false").unwrap(), json!(false));
    }

    #[test]
    fn test_decode_rejects_null_and_garbage() {
        for body in ["null", "{\"a\":", ""] {
            match decode(body.as_bytes()).unwrap_err() {
                AssertionError::InvalidJson { body: raw, .. } => assert_eq!(raw, body),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
