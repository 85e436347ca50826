//! Shared test support utilities for integration tests

#![allow(dead_code)]

use serde_json::Value as JsonValue;
use stowage_core::{
    BindOutcome, Binder, ClassId, ElementType, EnumDef, Instance, Registry, Request,
    SourceBundle, Value,
};

/// Class ids of the fixture registry
pub struct Fixtures {
    pub registry: Registry,
    pub address: ClassId,
    pub user: ClassId,
    pub order: ClassId,
    pub admin: ClassId,
}

/// Registry with a small set of realistic classes
pub fn fixtures() -> Fixtures {
    let mut registry = Registry::new();

    let address = registry
        .class("Address")
        .field("street", |f| f.body().string().min_length(3))
        .field("zipCode", |f| f.body().string().regexp(r"^\d{5}$"))
        .build()
        .expect("address registers");

    let user = registry
        .class("User")
        .field("id", |f| f.params().number().min(1.0))
        .field("email", |f| f.body().string().email())
        .field("name", |f| f.body().string().min_length(2).max_length(40))
        .field("address", |f| f.body().nested(address).optional())
        .field("tags", |f| {
            f.body()
                .array_of(ElementType::String)
                .default_value(Value::Array(Vec::new()))
        })
        .field("role", |f| {
            f.body()
                .enum_type(EnumDef::numeric("Role", ["Guest", "Member", "Owner"]))
                .default_value(0)
        })
        .field("authorization", |f| f.header().string().prefix("Bearer "))
        .build()
        .expect("user registers");

    let order = registry
        .class("Order")
        .field("price", |f| f.body().number().min(0.0))
        .field("quantity", |f| f.body().number().range(1.0, 99.0))
        .field("total", |f| {
            f.number().virtual_field(["price", "quantity"], |order: &Instance| {
                let price = order.get("price").as_f64().unwrap_or_default();
                let quantity = order.get("quantity").as_f64().unwrap_or_default();
                Ok(Value::Number(price * quantity))
            })
        })
        .build()
        .expect("order registers");

    let admin = registry
        .subclass("Admin", user)
        // Inherits the enum and default from User, adds one rule
        .field("role", |f| f.equal(2))
        .field("sessionId", |f| f.session().key("sid").string())
        .build()
        .expect("admin registers");

    Fixtures {
        registry,
        address,
        user,
        order,
        admin,
    }
}

/// Request with a JSON body and nothing else
pub fn body_request(body: JsonValue) -> SourceBundle {
    SourceBundle::new(Request::builder().body(body).build())
}

/// A user request that binds cleanly
pub fn valid_user_request() -> Request {
    Request::builder()
        .method("PUT")
        .path("/users/42")
        .param("id", "42")
        .header("Authorization", "Bearer abc.def")
        .body(serde_json::json!({
            "email": "ada@example.com",
            "name": "Ada",
            "address": {"street": "Main St", "zipCode": "12345"},
            "tags": ["admin", 7],
            "role": "Owner"
        }))
        .build()
}

/// Bind and panic with the report on failure
pub fn assert_binds(registry: &Registry, class: ClassId, bundle: &SourceBundle) -> Instance {
    match Binder::new(registry).bind(class, bundle) {
        Ok(instance) => instance,
        Err(err) => panic!("expected a clean bind, got: {}", err),
    }
}

/// Bind and return (field, message) pairs in report order
pub fn field_errors(registry: &Registry, class: ClassId, bundle: &SourceBundle) -> Vec<(String, String)> {
    let BindOutcome { errors, .. } = Binder::new(registry)
        .bind_outcome(class, bundle)
        .expect("class is registered");
    errors.into_iter().map(|e| (e.field, e.message)).collect()
}
