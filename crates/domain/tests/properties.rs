//! Property tests for the JSON comparison engine.

#![allow(clippy::unwrap_used)]

use hitest_domain::json::canonical::flatten;
use hitest_domain::json::{
    exact_eq, resolve, similar_eq, similar_form, sort_keys_flat, sort_recursive,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,6}".prop_map(Value::String),
    ]
}

fn document() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

fn pointer(path: &str) -> String {
    path.split('.').fold(String::new(), |mut acc, segment| {
        acc.push('/');
        acc.push_str(segment);
        acc
    })
}

proptest! {
    #[test]
    fn sort_recursive_is_idempotent(doc in document()) {
        let once = sort_recursive(&doc);
        prop_assert_eq!(sort_recursive(&once), once);
    }

    #[test]
    fn sort_keys_flat_is_idempotent(doc in document()) {
        let once = sort_keys_flat(&doc);
        prop_assert_eq!(sort_keys_flat(&once).to_string(), once.to_string());
    }

    #[test]
    fn canonical_forms_keep_the_document_equal_to_itself(doc in document()) {
        prop_assert!(exact_eq(&doc, &sort_keys_flat(&doc)));
        prop_assert!(similar_eq(&doc, &sort_recursive(&doc)));
    }

    #[test]
    fn key_order_does_not_affect_similar_form(
        entries in prop::collection::btree_map("[a-z]{1,4}", document(), 0..8)
    ) {
        let forward: Map<String, Value> = entries.clone().into_iter().collect();
        let backward: Map<String, Value> = entries.into_iter().rev().collect();
        prop_assert_eq!(
            similar_form(&Value::Object(forward)),
            similar_form(&Value::Object(backward))
        );
    }

    #[test]
    fn element_order_does_not_affect_similar_form(
        (items, shuffled) in prop::collection::vec(leaf(), 0..8)
            .prop_flat_map(|items| (Just(items.clone()), Just(items).prop_shuffle()))
    ) {
        prop_assert_eq!(
            similar_form(&Value::Array(items)),
            similar_form(&Value::Array(shuffled))
        );
    }

    #[test]
    fn resolve_matches_manual_traversal(doc in document()) {
        for (path, leaf) in flatten(&doc) {
            if path.is_empty() {
                continue;
            }
            let resolved = resolve(&doc, &path).unwrap().into_owned();
            prop_assert_eq!(&resolved, &leaf);
            prop_assert_eq!(doc.pointer(&pointer(&path)), Some(&leaf));
        }
    }
}

#[test]
fn wildcard_collects_each_element() {
    let doc = json!([{"a": 1}, {"a": 2}]);
    assert_eq!(resolve(&doc, "*.a").unwrap().into_owned(), json!([1, 2]));
}

#[test]
fn exact_and_similar_disagree_on_array_order() {
    let left = json!({"a": [1, 2]});
    let right = json!({"a": [2, 1]});
    assert!(similar_eq(&left, &right));
    assert!(!exact_eq(&left, &right));
    assert!(exact_eq(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
}
