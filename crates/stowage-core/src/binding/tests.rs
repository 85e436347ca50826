//! Tests for the binding orchestrator
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

#[cfg(test)]
mod tests {
    use super::super::{Binder, Request, SourceBundle};
    use crate::config::BindConfig;
    use crate::enum_type::EnumDef;
    use crate::error::FieldErrorKind;
    use crate::metadata::{ClassId, ElementType, Registry};
    use crate::value::{Instance, Value};
    use crate::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn body(json: serde_json::Value) -> SourceBundle {
        SourceBundle::new(Request::builder().body(json).build())
    }

    fn messages(registry: &Registry, class: ClassId, bundle: &SourceBundle) -> Vec<(String, String)> {
        Binder::new(registry)
            .bind_outcome(class, bundle)
            .unwrap()
            .errors
            .into_iter()
            .map(|e| (e.field, e.message))
            .collect()
    }

    fn pair(field: &str, message: &str) -> (String, String) {
        (field.to_string(), message.to_string())
    }

    #[test]
    fn test_all_fields_bind() {
        let mut registry = Registry::new();
        let class = registry
            .class("Signup")
            .field("name", |f| f.body().string().min_length(2))
            .field("age", |f| f.body().number().range(0.0, 150.0))
            .field("newsletter", |f| f.body().boolean())
            .field("page", |f| f.query().number())
            .build()
            .unwrap();

        let bundle = SourceBundle::new(
            Request::builder()
                .body(json!({"name": "Ada", "age": "36", "newsletter": "false"}))
                .query_param("page", "2")
                .build(),
        );
        let instance = Binder::new(&registry).bind(class, &bundle).unwrap();

        assert_eq!(instance.class_name(), Some("Signup"));
        assert_eq!(instance.get("name"), &Value::from("Ada"));
        assert_eq!(instance.get("age"), &Value::Number(36.0));
        assert_eq!(instance.get("newsletter"), &Value::Bool(false));
        assert_eq!(instance.get("page"), &Value::Number(2.0));
    }

    #[test]
    fn test_missing_fields() {
        let mut registry = Registry::new();
        let class = registry
            .class("Profile")
            .field("name", |f| f.body().string())
            .field("nickname", |f| f.body().string().optional())
            .field("role", |f| f.body().string().default_value("member"))
            .build()
            .unwrap();

        let outcome = Binder::new(&registry)
            .bind_outcome(class, &body(json!({"nickname": null})))
            .unwrap();

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].field, "name");
        assert_eq!(outcome.errors[0].message, "name is required");
        assert_eq!(outcome.errors[0].kind, FieldErrorKind::Field);
        assert_eq!(outcome.instance.get("nickname"), &Value::Null);
        assert_eq!(outcome.instance.get("role"), &Value::from("member"));
        assert!(outcome.instance.get("name").is_undefined());
    }

    #[test]
    fn test_nested_errors_are_path_qualified() {
        let mut registry = Registry::new();
        let sample = registry
            .class("Sample")
            .field("baseText", |f| f.body().string().min_length(3))
            .build()
            .unwrap();
        let parent = registry
            .class("Parent")
            .field("sample", |f| f.body().nested(sample))
            .field("title", |f| f.body().string())
            .build()
            .unwrap();

        let err = Binder::new(&registry)
            .bind(parent, &body(json!({"sample": {"baseText": "ab"}, "title": "Notes"})))
            .unwrap_err();
        let report = err.as_validation().unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(
            report.find("sample.baseText").unwrap().message,
            "sample.baseText must be at least 3 characters"
        );

        let partial = report.partial().unwrap();
        assert_eq!(partial.get("title"), &Value::from("Notes"));
        let nested = partial.get("sample").as_object().unwrap();
        assert_eq!(nested.class_name(), Some("Sample"));
        assert_eq!(nested.get("baseText"), &Value::from("ab"));
    }

    #[test]
    fn test_nested_required_error_keeps_siblings() {
        let mut registry = Registry::new();
        let sample = registry
            .class("Sample")
            .field("baseText", |f| f.body().string())
            .build()
            .unwrap();
        let parent = registry
            .class("Parent")
            .field("sample", |f| f.body().nested(sample))
            .field("t", |f| f.body().string())
            .build()
            .unwrap();

        let outcome = Binder::new(&registry)
            .bind_outcome(parent, &body(json!({"sample": {}, "t": "x"})))
            .unwrap();

        let errors = outcome
            .errors
            .iter()
            .map(|e| (e.field.clone(), e.message.clone()))
            .collect::<Vec<_>>();
        assert_eq!(errors, vec![pair("sample.baseText", "sample.baseText is required")]);
        assert_eq!(outcome.instance.get("t"), &Value::from("x"));
        assert!(outcome.instance.get("sample").as_object().is_some());
    }

    #[test]
    fn test_nested_value_must_be_object() {
        let mut registry = Registry::new();
        let address = registry
            .class("Address")
            .field("city", |f| f.body().string())
            .build()
            .unwrap();
        let user = registry
            .class("User")
            .field("address", |f| f.body().nested(address))
            .build()
            .unwrap();

        assert_eq!(
            messages(&registry, user, &body(json!({"address": "Main St"}))),
            vec![pair("address", "address must be an object")]
        );
    }

    #[test]
    fn test_array_elements_are_coerced() {
        let mut registry = Registry::new();
        let class = registry
            .class("Scores")
            .field("scores", |f| f.body().array_of(ElementType::Number))
            .build()
            .unwrap();

        let outcome = Binder::new(&registry)
            .bind_outcome(class, &body(json!({"scores": ["1", "2", "x"]})))
            .unwrap();

        assert_eq!(
            outcome.instance.get("scores"),
            &Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])
        );
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].field, "scores[2]");
        assert_eq!(outcome.errors[0].message, "scores[2] must be a valid number");
    }

    #[test]
    fn test_array_requires_array_input() {
        let mut registry = Registry::new();
        let class = registry
            .class("Tags")
            .field("tags", |f| f.body().array_of(ElementType::String))
            .build()
            .unwrap();

        assert_eq!(
            messages(&registry, class, &body(json!({"tags": "rust"}))),
            vec![pair("tags", "tags must be an array")]
        );
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut registry = Registry::new();
        let class = registry
            .class("Auth")
            .field("apiKey", |f| f.header().key("x-api-key").string())
            .build()
            .unwrap();

        let bundle = SourceBundle::new(Request::builder().header("X-Api-Key", "secret").build());
        let instance = Binder::new(&registry).bind(class, &bundle).unwrap();
        assert_eq!(instance.get("apiKey"), &Value::from("secret"));
    }

    #[test]
    fn test_virtual_field_sees_bound_fields() {
        let mut registry = Registry::new();
        let class = registry
            .class("Order")
            .field("total", |f| {
                f.number().virtual_field(["price", "quantity"], |order: &Instance| {
                    let price = order.get("price").as_f64().unwrap_or_default();
                    let quantity = order.get("quantity").as_f64().unwrap_or_default();
                    Ok(Value::Number(price * quantity))
                })
            })
            .field("price", |f| f.body().number())
            .field("quantity", |f| f.body().number())
            .build()
            .unwrap();

        let instance = Binder::new(&registry)
            .bind(class, &body(json!({"price": 3, "quantity": "4"})))
            .unwrap();
        assert_eq!(instance.get("total"), &Value::Number(12.0));
    }

    #[test]
    fn test_request_field() {
        let mut registry = Registry::new();
        let class = registry
            .class("Audit")
            .field("method", |f| {
                f.request(|req: &Request| Ok(Value::from(req.method.clone())))
            })
            .field("userId", |f| f.params().key("id").number())
            .build()
            .unwrap();

        let bundle = SourceBundle::new(
            Request::builder()
                .method("DELETE")
                .param("id", "17")
                .build(),
        );
        let instance = Binder::new(&registry).bind(class, &bundle).unwrap();
        assert_eq!(instance.get("method"), &Value::from("DELETE"));
        assert_eq!(instance.get("userId"), &Value::Number(17.0));
    }

    #[test]
    fn test_request_field_validates_its_value() {
        let mut registry = Registry::new();
        let class = registry
            .class("Audit")
            .field("method", |f| {
                f.request(|req: &Request| Ok(Value::from(req.method.clone())))
                    .one_of(["GET", "POST"])
            })
            .build()
            .unwrap();

        let bundle = SourceBundle::new(Request::builder().method("PUT").build());
        let errors = messages(&registry, class, &bundle);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "method");
    }

    #[test]
    fn test_transformer_failures() {
        let mut registry = Registry::new();
        let class = registry
            .class("Checkout")
            .field("coupon", |f| {
                f.body()
                    .string()
                    .transform(|_: Value| Err(anyhow::anyhow!("coupon expired")))
                    .min_length(50)
            })
            .field("price", |f| {
                f.body().number().transform(|_: Value| -> anyhow::Result<Value> {
                    panic!("bad price")
                })
            })
            .field("total", |f| {
                f.virtual_field(["price"], |_: &Instance| Err(anyhow::anyhow!("no total")))
            })
            .build()
            .unwrap();

        let outcome = Binder::new(&registry)
            .bind_outcome(class, &body(json!({"coupon": "SAVE10", "price": 5})))
            .unwrap();

        let found = outcome
            .errors
            .iter()
            .map(|e| (e.field.as_str(), e.message.as_str(), e.kind))
            .collect::<Vec<_>>();
        assert_eq!(
            found,
            vec![
                ("coupon", "coupon transform failed: coupon expired", FieldErrorKind::Transform),
                ("price", "price transform failed: bad price", FieldErrorKind::Transform),
                ("total", "total transform failed: no total", FieldErrorKind::Transform),
            ]
        );
        // The untransformed value is kept
        assert_eq!(outcome.instance.get("coupon"), &Value::from("SAVE10"));
        assert_eq!(outcome.instance.get("price"), &Value::Number(5.0));
    }

    #[test]
    fn test_sourceless_fields() {
        let mut registry = Registry::new();
        let class = registry
            .class("Stamp")
            .field("createdBy", |f| {
                f.no_source().transform(|_: Value| Ok(Value::from("system")))
            })
            .field("orphan", |f| f.no_source())
            .build()
            .unwrap();

        let outcome = Binder::new(&registry)
            .bind_outcome(class, &body(json!({"orphan": 1})))
            .unwrap();
        assert_eq!(outcome.instance.get("createdBy"), &Value::from("system"));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].message, "orphan has no source or transformer");
        assert!(outcome.errors[0].is_transform());
    }

    #[test]
    fn test_empty_key_is_reported() {
        let mut registry = Registry::new();
        let class = registry
            .class("Broken")
            .field("name", |f| f.body().key("").string())
            .build()
            .unwrap();

        assert_eq!(
            messages(&registry, class, &body(json!({"": "x", "name": "y"}))),
            vec![pair("name", "empty key is not allowed")]
        );
    }

    #[test]
    fn test_enum_coercion() {
        let mut registry = Registry::new();
        let class = registry
            .class("Member")
            .field("role", |f| f.body().enum_type(EnumDef::numeric("Role", ["Admin", "User"])))
            .field("color", |f| {
                f.query().enum_type(
                    EnumDef::new("Color")
                        .variant("Red", "red")
                        .variant("Blue", "blue"),
                )
            })
            .build()
            .unwrap();

        let bundle = SourceBundle::new(
            Request::builder()
                .body(json!({"role": "User"}))
                .query_param("color", "blue")
                .build(),
        );
        let instance = Binder::new(&registry).bind(class, &bundle).unwrap();
        assert_eq!(instance.get("role"), &Value::Number(1.0));
        assert_eq!(instance.get("color"), &Value::from("blue"));

        let bundle = SourceBundle::new(
            Request::builder()
                .body(json!({"role": "Guest"}))
                .query_param("color", "Red")
                .build(),
        );
        assert_eq!(
            messages(&registry, class, &bundle),
            vec![pair("role", "role must be one of: 0, 1")]
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut registry = Registry::new();
        let node = registry.declare_class("Node", None).unwrap();
        registry
            .reopen(node)
            .field("value", |f| f.body().number())
            .field("child", |f| f.body().nested(node).optional())
            .build()
            .unwrap();

        let bundle = body(json!({
            "value": 1,
            "child": {"value": 2, "child": {"value": 3}}
        }));
        let binder = Binder::with_config(&registry, BindConfig::default().with_max_depth(1));
        let outcome = binder.bind_outcome(node, &bundle).unwrap();

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].field, "child.child");
        assert_eq!(
            outcome.errors[0].message,
            "child.child exceeds maximum nesting depth of 1"
        );
        let child = outcome.instance.get("child").as_object().unwrap();
        assert_eq!(child.get("value"), &Value::Number(2.0));
        assert_eq!(child.get("child"), &Value::Null);

        assert!(Binder::new(&registry).bind(node, &bundle).is_ok());
    }

    #[test]
    fn test_cross_field_rules_see_earlier_fields() {
        let mut registry = Registry::new();
        let class = registry
            .class("Reset")
            .field("confirm", |f| f.body().string().optional())
            .field("password", |f| f.body().string().with("confirm"))
            .field("token", |f| f.body().string().optional().without("password"))
            .build()
            .unwrap();

        let ok = body(json!({"password": "hunter22", "confirm": "hunter22"}));
        assert!(Binder::new(&registry).bind(class, &ok).is_ok());

        let bad = body(json!({"password": "hunter22", "token": "abc"}));
        assert_eq!(
            messages(&registry, class, &bad),
            vec![
                pair("password", "password requires confirm"),
                pair("token", "token cannot exist with password"),
            ]
        );
    }

    #[test]
    fn test_cross_field_rules_do_not_see_later_fields() {
        let mut registry = Registry::new();
        let class = registry
            .class("Late")
            .field("a", |f| f.body().string().with("b"))
            .field("b", |f| f.body().string())
            .build()
            .unwrap();

        assert_eq!(
            messages(&registry, class, &body(json!({"a": "x", "b": "y"}))),
            vec![pair("a", "a requires b")]
        );
    }

    #[test]
    fn test_errors_follow_field_order() {
        let mut registry = Registry::new();
        let class = registry
            .class("Ordered")
            .field("a", |f| f.body().number().max(10.0))
            .field("b", |f| f.body().string())
            .build()
            .unwrap();

        assert_eq!(
            messages(&registry, class, &body(json!({"a": 15}))),
            vec![pair("a", "a must be <= 10"), pair("b", "b is required")]
        );
    }

    #[test]
    fn test_max_violation_fails_the_bind() {
        let mut registry = Registry::new();
        let class = registry
            .class("Limit")
            .field("number", |f| f.body().number().max(10.0))
            .build()
            .unwrap();

        let err = Binder::new(&registry)
            .bind(class, &body(json!({"number": 15})))
            .unwrap_err();
        let Error::Validation(report) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].field, "number");
        assert_eq!(report.errors()[0].message, "number must be <= 10");
    }

    #[test]
    fn test_partial_instance_can_be_dropped() {
        let mut registry = Registry::new();
        let class = registry
            .class("Login")
            .field("email", |f| f.body().string().email())
            .build()
            .unwrap();

        let bundle = body(json!({"email": "nope"}));
        let err = Binder::with_config(&registry, BindConfig::default().with_collect_partial(false))
            .bind(class, &bundle)
            .unwrap_err();
        let report = err.as_validation().unwrap();
        assert!(report.partial().is_none());
        assert_eq!(report.errors()[0].message, "email must be a valid email address");
    }

    #[test]
    fn test_binding_is_repeatable() {
        let mut registry = Registry::new();
        let class = registry
            .class("Search")
            .field("q", |f| f.query().string().min_length(1))
            .field("limit", |f| f.query().number().max(100.0).default_value(20))
            .build()
            .unwrap();

        let bundle = SourceBundle::new(
            Request::builder()
                .query(json!({"q": "", "limit": "500"}))
                .build(),
        );
        let binder = Binder::new(&registry);
        let first = binder.bind_outcome(class, &bundle).unwrap();
        let second = binder.bind_outcome(class, &bundle).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.errors.len(), 2);
    }

    #[test]
    fn test_inherited_fields_bind_in_subclass() {
        let mut registry = Registry::new();
        let base = registry
            .class("Base")
            .field("id", |f| f.params().number())
            .build()
            .unwrap();
        let child = registry
            .subclass("Child", base)
            .field("name", |f| f.body().string())
            .build()
            .unwrap();

        let bundle = SourceBundle::new(
            Request::builder()
                .param("id", "9")
                .body(json!({"name": "kid"}))
                .build(),
        );
        let instance = Binder::new(&registry).bind(child, &bundle).unwrap();
        assert_eq!(instance.class_name(), Some("Child"));
        assert_eq!(
            instance.fields().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["name", "id"]
        );
        assert_eq!(instance.get("id"), &Value::Number(9.0));
    }

    #[test]
    fn test_unknown_class_fails_the_call() {
        let registry = Registry::new();
        let mut other = Registry::new();
        let foreign = other.class("Elsewhere").build().unwrap();

        let err = Binder::new(&registry)
            .bind(foreign, &body(json!({})))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownClass { .. }));
    }
}
