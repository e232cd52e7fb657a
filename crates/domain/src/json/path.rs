//! Dot-delimited path resolution.
//!
//! A path is `segment(.segment)*`. Segments address object keys or array
//! indices; the reserved segment `*` fans out over every element of the
//! current array (or every value of the current object).

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use super::child;
use crate::error::{AssertResult, AssertionError};

/// The reserved wildcard segment.
pub const WILDCARD: &str = "*";

/// A parsed dot-delimited address into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPath {
    raw: String,
    segments: Vec<String>,
}

impl JsonPath {
    /// Parses an address. The empty string addresses the whole document.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let segments = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(str::to_owned).collect()
        };
        Self {
            raw: path.to_owned(),
            segments,
        }
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if this path addresses the whole document.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true if any segment is the wildcard.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| s == WILDCARD)
    }

    /// Returns the address as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolves this path against a document.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::PathNotFound`] if a non-wildcard segment is
    /// missing or a wildcard is applied to a scalar.
    pub fn resolve<'a>(&self, value: &'a Value) -> AssertResult<Cow<'a, Value>> {
        walk(value, &self.segments).ok_or_else(|| AssertionError::PathNotFound {
            path: self.raw.clone(),
        })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for JsonPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Resolves `path` against `value`.
///
/// Plain paths borrow from the document; wildcard paths build a new array.
///
/// # Errors
///
/// Returns [`AssertionError::PathNotFound`] when the path does not exist.
pub fn resolve<'a>(value: &'a Value, path: &str) -> AssertResult<Cow<'a, Value>> {
    JsonPath::parse(path).resolve(value)
}

/// Resolves `path` and coerces the result to a sequence.
///
/// Arrays are returned as-is, `null` becomes an empty sequence and any other
/// value (scalar or object) is wrapped in a one-element sequence.
///
/// # Errors
///
/// Returns [`AssertionError::PathNotFound`] when the path does not exist.
pub fn resolve_as_array(value: &Value, path: &str) -> AssertResult<Vec<Value>> {
    Ok(match resolve(value, path)?.into_owned() {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

/// Returns true if `path` resolves against `value`.
#[must_use]
pub fn has_path(value: &Value, path: &str) -> bool {
    walk(value, JsonPath::parse(path).segments()).is_some()
}

fn walk<'a>(value: &'a Value, segments: &[String]) -> Option<Cow<'a, Value>> {
    let mut current = value;
    for (index, segment) in segments.iter().enumerate() {
        if segment == WILDCARD {
            return expand_wildcard(current, &segments[index + 1..]).map(Cow::Owned);
        }
        current = child(current, segment)?;
    }
    Some(Cow::Borrowed(current))
}

// Elements where the remaining path is missing contribute `null` so the
// result stays aligned with the source sequence.
fn expand_wildcard(target: &Value, rest: &[String]) -> Option<Value> {
    let items: Vec<&Value> = match target {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => return None,
    };

    let flatten = rest.iter().any(|s| s == WILDCARD);
    let mut results = Vec::with_capacity(items.len());

    for item in items {
        match walk(item, rest).map_or(Value::Null, Cow::into_owned) {
            Value::Array(nested) if flatten => results.extend(nested),
            other => results.push(other),
        }
    }

    Some(Value::Array(results))
}
