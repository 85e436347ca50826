//! Property-based tests for the binding engine
//!
//! These tests check invariants that should hold for any request data.

use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};
use stowage_core::{Binder, ElementType, Registry, Request, SourceBundle, Value};

/// Either a number, a numeric string, or a word that never parses as a number
fn element_strategy() -> impl Strategy<Value = (JsonValue, bool)> {
    prop_oneof![
        (-1000i64..1000).prop_map(|n| (json!(n), true)),
        (-1000i64..1000).prop_map(|n| (json!(n.to_string()), true)),
        "[g-m]{1,8}".prop_map(|s| (json!(s), false)),
    ]
}

/// Arbitrary JSON scalars for untyped bodies
fn scalar_strategy() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::from),
        (-1.0e6f64..1.0e6).prop_map(|n| json!(n)),
        "[a-zA-Z0-9 @.]{0,20}".prop_map(JsonValue::from),
    ]
}

fn numbers_registry() -> (Registry, stowage_core::ClassId) {
    let mut registry = Registry::new();
    let class = registry
        .class("Numbers")
        .field("values", |f| f.body().array_of(ElementType::Number))
        .build()
        .unwrap();
    (registry, class)
}

proptest! {
    #[test]
    fn prop_array_elements_coerce_independently(elements in prop::collection::vec(element_strategy(), 0..20)) {
        let (registry, class) = numbers_registry();
        let raw: Vec<JsonValue> = elements.iter().map(|(v, _)| v.clone()).collect();
        let bundle = SourceBundle::new(Request::builder().body(json!({"values": raw})).build());

        let outcome = Binder::new(&registry).bind_outcome(class, &bundle).unwrap();

        let expected_bad: Vec<String> = elements
            .iter()
            .enumerate()
            .filter(|(_, (_, numeric))| !numeric)
            .map(|(i, _)| format!("values[{}]", i))
            .collect();
        let reported: Vec<String> = outcome.errors.iter().map(|e| e.field.clone()).collect();
        prop_assert_eq!(reported, expected_bad);

        let kept = outcome.instance.get("values").as_array().map(<[Value]>::len).unwrap_or(0);
        prop_assert_eq!(kept, elements.iter().filter(|(_, numeric)| *numeric).count());
    }

    #[test]
    fn prop_binding_is_idempotent(
        name in scalar_strategy(),
        age in scalar_strategy(),
        tag in scalar_strategy(),
    ) {
        let mut registry = Registry::new();
        let class = registry
            .class("Person")
            .field("name", |f| f.body().string().min_length(2))
            .field("age", |f| f.body().number().range(0.0, 150.0).optional())
            .field("tag", |f| f.body().default_value("none"))
            .build()
            .unwrap();

        let bundle = SourceBundle::new(
            Request::builder()
                .body(json!({"name": name, "age": age, "tag": tag}))
                .build(),
        );
        let binder = Binder::new(&registry);
        let first = binder.bind_outcome(class, &bundle).unwrap();
        let second = binder.bind_outcome(class, &bundle).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_optional_fields_never_error_when_absent(present in any::<bool>(), value in -100i64..100) {
        let mut registry = Registry::new();
        let class = registry
            .class("Filter")
            .field("limit", |f| f.query().number().optional())
            .build()
            .unwrap();

        let query = if present { json!({"limit": value.to_string()}) } else { json!({}) };
        let bundle = SourceBundle::new(Request::builder().query(query).build());
        let instance = Binder::new(&registry).bind(class, &bundle).unwrap();

        let expected = if present { Value::Number(value as f64) } else { Value::Null };
        prop_assert_eq!(instance.get("limit"), &expected);
    }
}
