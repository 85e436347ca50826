//! Stowage Core - Declarative request binding and validation
//!
//! Classes are described once in a [`Registry`]: which request source each
//! field comes from, its type, whether it is optional, its default, its
//! validators and transformers. A [`Binder`] then walks that description
//! against incoming request data and produces a typed [`Instance`], or one
//! [`ValidationError`] listing every field that failed.
//!
//! # Main Components
//!
//! - **Metadata**: per-class field descriptors with inheritance (`metadata`)
//! - **Validators**: reusable field rules and their messages (`validator`)
//! - **Coercion**: conversion of raw JSON into declared types (`coercion`, `enum_type`)
//! - **Binding**: the three-pass orchestrator (`binding`)
//! - **Pipeline glue**: error handler and middleware helpers (`handler`, `middleware`)
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use stowage_core::{Binder, Registry, Request, SourceBundle, Value};
//!
//! let mut registry = Registry::new();
//! let order = registry
//!     .class("Order")
//!     .field("price", |f| f.body().number().min(0.0))
//!     .field("quantity", |f| f.body().number().default_value(1))
//!     .build()
//!     .unwrap();
//!
//! let bundle = SourceBundle::new(Request::builder().body(json!({"price": "9.5"})).build());
//! let instance = Binder::new(&registry).bind(order, &bundle).unwrap();
//! assert_eq!(instance.get("price"), &Value::Number(9.5));
//! assert_eq!(instance.get("quantity"), &Value::Number(1.0));
//! ```

pub mod binding;
pub mod coercion;
pub mod config;
pub mod enum_type;
pub mod error;
pub mod handler;
pub mod logging;
pub mod metadata;
pub mod middleware;
pub mod validator;
pub mod value;

// Re-export main types for convenience
pub use binding::{BindOutcome, Binder, Request, RequestBuilder, SourceBundle};
pub use config::BindConfig;
pub use enum_type::{EnumDef, EnumValue};
pub use error::{Error, FieldError, FieldErrorKind, Result, ValidationError};
pub use handler::{
    clear_error_handler, error_handler, scoped_error_handler, set_error_handler,
    with_error_handler, ErrorHandler, ErrorHandlerGuard,
};
pub use metadata::{
    ClassBuilder, ClassId, ElementType, FieldBuilder, FieldDescriptor, FieldType, Registry,
    Source,
};
pub use middleware::{bind_request, handle_error, Outcome, RequestContext, Response};
pub use validator::{Message, RuleKind, UuidVersion, ValidatorRule};
pub use value::{Instance, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
