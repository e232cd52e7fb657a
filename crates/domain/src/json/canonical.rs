//! Canonical forms for order-insensitive comparison.
//!
//! Two forms are provided and they deliberately disagree on arrays:
//!
//! - The **key-sorted flat form** ([`sort_keys_flat`]) flattens the document
//!   into `dot.path -> leaf` pairs, sorts the pairs by path and rebuilds a
//!   tree. Object key order is erased, array element order is kept (indices
//!   become part of the path). Used for *exact* equality.
//! - The **recursive value-sorted form** ([`sort_recursive`]) sorts object
//!   keys and array elements at every level. Neither key order nor element
//!   order survives. Used for *similar* equality and fragment search.
//!
//! Both forms are idempotent.
//!
//! The flat form cannot represent an object key that itself contains a dot
//! next to a real nested path with the same prefix: `{"a": 1, "a.b": 2}`
//! flattens to `a` and `a.b`, and rebuilding keeps only the nested leaf, so
//! it compares exactly equal to `{"a": {"b": 2}}`.

use serde_json::{Map, Value};

/// Flattens a document into `dot.path -> leaf` pairs in document order.
///
/// Scalars and empty containers are leaves. A leaf document yields a single
/// pair with an empty path.
#[must_use]
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut pairs = Vec::new();
    flatten_into(value, None, &mut pairs);
    pairs
}

fn flatten_into(value: &Value, prefix: Option<&str>, out: &mut Vec<(String, Value)>) {
    let join = |key: &str| prefix.map_or_else(|| key.to_owned(), |p| format!("{p}.{key}"));
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(child, Some(&join(key)), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, Some(&join(&index.to_string())), out);
            }
        }
        leaf => out.push((prefix.unwrap_or_default().to_owned(), leaf.clone())),
    }
}

/// Builds the key-sorted flat form of a document.
///
/// The rebuilt tree only contains objects: array indices become object keys.
/// `{"a": [1]}` and `{"a": {"0": 1}}` therefore share a canonical form.
#[must_use]
pub fn sort_keys_flat(value: &Value) -> Value {
    if !is_non_empty_container(value) {
        return value.clone();
    }

    let mut pairs = flatten(value);
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut root = Map::new();
    for (path, leaf) in pairs {
        insert_at(&mut root, &path, leaf);
    }
    Value::Object(root)
}

fn is_non_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

fn insert_at(target: &mut Map<String, Value>, path: &str, leaf: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_owned(), leaf);
        }
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_at(child, rest, leaf);
            }
        }
    }
}

/// Builds the recursive value-sorted form of a document.
///
/// Object keys are sorted by string order; array elements are sorted by
/// their own canonical serialization.
#[must_use]
pub fn sort_recursive(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, Value)> =
                map.iter().map(|(k, v)| (k, sort_recursive(v))).collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(entries.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => {
            let mut keyed: Vec<(String, Value)> = items
                .iter()
                .map(|item| {
                    let sorted = sort_recursive(item);
                    (sorted.to_string(), sorted)
                })
                .collect();
            keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Array(keyed.into_iter().map(|(_, v)| v).collect())
        }
        scalar => scalar.clone(),
    }
}

/// Pretty-printed key-sorted flat form, the text compared by exact equality.
#[must_use]
pub fn exact_form(value: &Value) -> String {
    format!("{:#}", sort_keys_flat(value))
}

/// Compact recursive value-sorted form, the text compared by similar equality.
#[must_use]
pub fn similar_form(value: &Value) -> String {
    sort_recursive(value).to_string()
}

/// Exact equality: key order ignored, array order significant.
#[must_use]
pub fn exact_eq(left: &Value, right: &Value) -> bool {
    exact_form(left) == exact_form(right)
}

/// Similar equality: neither key order nor array order is significant.
#[must_use]
pub fn similar_eq(left: &Value, right: &Value) -> bool {
    similar_form(left) == similar_form(right)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_flatten_paths() {
        let doc = json!({"b": {"c": 1, "d": []}, "a": [true, null]});
        let paths: Vec<String> = flatten(&doc).into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["b.c", "b.d", "a.0", "a.1"]);
    }

    #[test]
    fn test_flatten_scalar_root() {
        assert_eq!(flatten(&json!(7)), vec![(String::new(), json!(7))]);
    }

    #[test]
    fn test_sort_keys_flat_orders_keys() {
        let doc = json!({"z": 1, "a": {"y": 2, "b": 3}});
        let sorted = sort_keys_flat(&doc);
        let keys: Vec<&String> = sorted.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "z"]);
        assert_eq!(sorted.to_string(), r#"{"a":{"b":3,"y":2},"z":1}"#);
    }

    #[test]
    fn test_exact_ignores_key_order() {
        assert!(exact_eq(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
    }

    #[test]
    fn test_exact_respects_array_order() {
        assert!(!exact_eq(&json!({"a": [1, 2]}), &json!({"a": [2, 1]})));
    }

    #[test]
    fn test_similar_ignores_array_order() {
        assert!(similar_eq(&json!({"a": [1, 2]}), &json!({"a": [2, 1]})));
        assert!(similar_eq(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
    }

    #[test]
    fn test_similar_detects_value_change() {
        assert!(!similar_eq(&json!({"a": [1, 2]}), &json!({"a": [1, 3]})));
    }

    #[test]
    fn test_sort_recursive_nested_arrays_of_objects() {
        let left = json!([{"id": 2, "tags": ["b", "a"]}, {"id": 1}]);
        let right = json!([{"id": 1}, {"tags": ["a", "b"], "id": 2}]);
        assert_eq!(similar_form(&left), similar_form(&right));
    }

    #[test]
    fn test_exact_distinguishes_leaf_types() {
        assert!(!exact_eq(&json!({"a": 1}), &json!({"a": "1"})));
        assert!(!exact_eq(&json!({"a": []}), &json!({"a": {}})));
    }

    #[test]
    fn test_dotted_key_collision_drops_leaf() {
        let dotted = json!({"a": 1, "a.b": 2});
        assert_eq!(sort_keys_flat(&dotted), json!({"a": {"b": 2}}));
        assert!(exact_eq(&dotted, &json!({"a": {"b": 2}})));
    }

    #[test]
    fn test_forms_are_idempotent() {
        let doc = json!({"k": [{"b": 1, "a": [3, 1]}, "x"], "e": {}});
        assert_eq!(sort_keys_flat(&sort_keys_flat(&doc)), sort_keys_flat(&doc));
        assert_eq!(sort_recursive(&sort_recursive(&doc)), sort_recursive(&doc));
    }
}
