//! Key removal ahead of fixture comparison.

use serde_json::Value;

/// Returns a copy of `value` with every member named in `keys` removed.
///
/// Removal applies at every depth, including objects nested inside arrays,
/// and does not depend on the removed value's type.
#[must_use]
pub fn remove_keys<S: AsRef<str>>(value: &Value, keys: &[S]) -> Value {
    if keys.is_empty() {
        return value.clone();
    }

    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !keys.iter().any(|k| k.as_ref() == key.as_str()))
                .map(|(key, child)| (key.clone(), remove_keys(child, keys)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|item| remove_keys(item, keys)).collect()),
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_removes_at_every_depth() {
        let doc = json!({
            "id": 1,
            "updated_at": "2024-01-01",
            "items": [{"id": 2, "updated_at": "x"}, {"nested": {"updated_at": {"a": 1}}}]
        });
        assert_eq!(
            remove_keys(&doc, &["updated_at"]),
            json!({"id": 1, "items": [{"id": 2}, {"nested": {}}]})
        );
    }

    #[test]
    fn test_no_keys_is_identity() {
        let doc = json!({"a": [1, {"b": 2}]});
        assert_eq!(remove_keys::<&str>(&doc, &[]), doc);
    }

    #[test]
    fn test_input_not_mutated() {
        let doc = json!({"a": 1, "b": 2});
        let pruned = remove_keys(&doc, &["a".to_string()]);
        assert_eq!(pruned, json!({"b": 2}));
        assert_eq!(doc, json!({"a": 1, "b": 2}));
    }
}
