//! Validator rule set
//!
//! Rules are plain values: a field name, a [`RuleKind`], a predicate over the
//! coerced value (plus the partially bound instance for cross-field rules) and
//! a failure message. The binder runs every rule of a field and turns each
//! failure into exactly one [`FieldError`](crate::FieldError).
//!
//! The module is organized into:
//! - `types`: rule, message and kind types
//! - `rules`: built-in rule constructors
//! - `patterns`: compiled regular expressions used by the string rules
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

pub mod patterns;
pub mod rules;
pub mod types;


pub use patterns::UuidVersion;
pub use types::{Message, MessageFn, Predicate, RuleKind, ValidatorRule};
