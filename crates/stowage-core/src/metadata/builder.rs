//! Fluent registration API
//!
//! Every builder method is one read-modify-write of a single descriptor:
//! the field's current record is fetched (inherited or fresh), changed, and
//! stored back on the class being built. Source, type and flag setters are
//! idempotent; rule setters append.
//!
//! ```
//! use stowage_core::{ElementType, Registry};
//!
//! let mut registry = Registry::new();
//! let user = registry
//!     .class("User")
//!     .field("name", |f| f.body().string().min_length(2))
//!     .field("age", |f| f.query().number().range(0.0, 150.0))
//!     .field("tags", |f| f.body().array_of(ElementType::String).optional())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(registry.field_list(user).unwrap(), vec!["name", "age", "tags"]);
//! ```
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

use super::registry::Registry;
use super::types::{ClassId, ElementType, FieldDescriptor, FieldType, Source};
use crate::binding::Request;
use crate::enum_type::EnumDef;
use crate::validator::{rules, Message, RuleKind, UuidVersion, ValidatorRule};
use crate::value::{Instance, Value};
use crate::{Error, Result};
use std::sync::Arc;

impl Registry {
    /// Declare a root class and start registering its fields
    pub fn class(&mut self, name: impl Into<String>) -> ClassBuilder<'_> {
        let state = self.declare_class(name, None);
        ClassBuilder {
            registry: self,
            state,
        }
    }

    /// Declare a class extending `parent`
    pub fn subclass(&mut self, name: impl Into<String>, parent: ClassId) -> ClassBuilder<'_> {
        let state = self.declare_class(name, Some(parent));
        ClassBuilder {
            registry: self,
            state,
        }
    }

    /// Register more fields on an existing class
    pub fn reopen(&mut self, class: ClassId) -> ClassBuilder<'_> {
        let state = self.class_name(class).map(|_| class);
        ClassBuilder {
            registry: self,
            state,
        }
    }
}

/// Builder for the fields of one class
///
/// The first failure is kept and returned from [`ClassBuilder::build`];
/// later field calls are skipped.
pub struct ClassBuilder<'r> {
    registry: &'r mut Registry,
    state: Result<ClassId>,
}

impl<'r> ClassBuilder<'r> {
    /// The class being built, unless declaration failed
    pub fn class_id(&self) -> Option<ClassId> {
        self.state.as_ref().ok().copied()
    }

    /// Configure one field
    pub fn field<F>(mut self, name: &str, configure: F) -> Self
    where
        F: FnOnce(FieldBuilder) -> FieldBuilder,
    {
        let class = match &self.state {
            Ok(class) => *class,
            Err(_) => return self,
        };

        let result = self
            .registry
            .get_or_create(class, name)
            .and_then(|descriptor| configure(FieldBuilder::new(descriptor)).finish())
            .and_then(|descriptor| self.registry.set(class, name, descriptor));

        if let Err(err) = result {
            self.state = Err(err);
        }
        self
    }

    /// Finish registration
    pub fn build(self) -> Result<ClassId> {
        self.state
    }
}

/// Builder for a single field descriptor
pub struct FieldBuilder {
    descriptor: FieldDescriptor,
    error: Option<Error>,
}

impl FieldBuilder {
    pub fn new(descriptor: FieldDescriptor) -> Self {
        Self {
            descriptor,
            error: None,
        }
    }

    /// The descriptor as configured so far
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Validate and return the descriptor
    pub fn finish(self) -> Result<FieldDescriptor> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.descriptor
            .check_invariants()
            .map_err(|message| Error::configuration(message, None))?;
        Ok(self.descriptor)
    }

    fn fail(mut self, message: String) -> Self {
        if self.error.is_none() {
            self.error = Some(Error::configuration(message, None));
        }
        self
    }

    fn rule(mut self, rule: ValidatorRule) -> Self {
        self.descriptor.validators.push(rule);
        self
    }

    fn name(&self) -> String {
        self.descriptor.name.clone()
    }

    // Sources

    /// Set the source; the lookup key resets to the field name
    pub fn source(mut self, source: Source) -> Self {
        self.descriptor.source = source;
        self.descriptor.key = self.descriptor.name.clone();
        self
    }

    /// Override the lookup key inside the source
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.descriptor.key = key.into();
        self
    }

    pub fn body(self) -> Self {
        self.source(Source::Body)
    }

    pub fn query(self) -> Self {
        self.source(Source::Query)
    }

    pub fn params(self) -> Self {
        self.source(Source::Params)
    }

    /// Same as [`FieldBuilder::params`]
    pub fn uri(self) -> Self {
        self.params()
    }

    pub fn header(self) -> Self {
        self.source(Source::Header)
    }

    pub fn session(self) -> Self {
        self.source(Source::Session)
    }

    /// Declared with no origin; binding reports it unless a transformer exists
    pub fn no_source(self) -> Self {
        self.source(Source::None)
    }

    // Types

    pub fn of_type(mut self, ty: FieldType) -> Self {
        self.descriptor.declared_type = ty;
        self
    }

    pub fn string(self) -> Self {
        self.of_type(FieldType::String)
    }

    pub fn number(self) -> Self {
        self.of_type(FieldType::Number)
    }

    pub fn boolean(self) -> Self {
        self.of_type(FieldType::Boolean)
    }

    pub fn date(self) -> Self {
        self.of_type(FieldType::Date)
    }

    /// Nested object bound as an instance of `class`
    pub fn nested(self, class: ClassId) -> Self {
        self.of_type(FieldType::Object(class))
    }

    /// Array with untyped elements
    pub fn array(self) -> Self {
        self.of_type(FieldType::Array(None))
    }

    pub fn array_of(self, element: ElementType) -> Self {
        self.of_type(FieldType::Array(Some(element)))
    }

    // Presence

    pub fn optional(mut self) -> Self {
        self.descriptor.optional = true;
        self
    }

    /// Value used when the field is absent
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.descriptor.default_value = Some(value.into());
        self
    }

    /// Enum coercion plus a membership rule
    pub fn enum_type(mut self, def: impl Into<Arc<EnumDef>>) -> Self {
        let def = def.into();
        let rule = def.membership_rule(self.name());
        self.descriptor.enum_type = Some(def);
        // Re-registering replaces the membership rule in place
        let existing = self
            .descriptor
            .validators
            .iter()
            .position(|r| r.kind() == RuleKind::Enum);
        match existing {
            Some(index) => {
                self.descriptor.validators[index] = rule;
                self
            }
            None => self.rule(rule),
        }
    }

    // Rules

    pub fn min(self, minimum: f64) -> Self {
        let rule = rules::min(self.name(), minimum);
        self.rule(rule)
    }

    pub fn max(self, maximum: f64) -> Self {
        let rule = rules::max(self.name(), maximum);
        self.rule(rule)
    }

    pub fn range(self, low: f64, high: f64) -> Self {
        let rule = rules::range(self.name(), low, high);
        self.rule(rule)
    }

    pub fn equal(self, expected: impl Into<Value>) -> Self {
        let rule = rules::equal(self.name(), expected);
        self.rule(rule)
    }

    pub fn not_equal(self, unexpected: impl Into<Value>) -> Self {
        let rule = rules::not_equal(self.name(), unexpected);
        self.rule(rule)
    }

    pub fn prefix(self, text: impl Into<String>) -> Self {
        let rule = rules::prefix(self.name(), text);
        self.rule(rule)
    }

    pub fn suffix(self, text: impl Into<String>) -> Self {
        let rule = rules::suffix(self.name(), text);
        self.rule(rule)
    }

    pub fn length(self, count: usize) -> Self {
        let rule = rules::length(self.name(), count);
        self.rule(rule)
    }

    pub fn min_length(self, count: usize) -> Self {
        let rule = rules::min_length(self.name(), count);
        self.rule(rule)
    }

    pub fn max_length(self, count: usize) -> Self {
        let rule = rules::max_length(self.name(), count);
        self.rule(rule)
    }

    pub fn one_of<I, V>(self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let options = options.into_iter().map(Into::into).collect();
        let rule = rules::one_of(self.name(), options);
        self.rule(rule)
    }

    pub fn is_true(self) -> Self {
        let rule = rules::is_true(self.name());
        self.rule(rule)
    }

    pub fn is_false(self) -> Self {
        let rule = rules::is_false(self.name());
        self.rule(rule)
    }

    /// Pattern match; an invalid pattern fails the registration
    pub fn regexp(self, pattern: &str) -> Self {
        match rules::regexp(self.name(), pattern) {
            Ok(rule) => self.rule(rule),
            Err(err) => self.fail(err.to_string()),
        }
    }

    pub fn email(self) -> Self {
        let rule = rules::email(self.name());
        self.rule(rule)
    }

    pub fn alpha(self) -> Self {
        let rule = rules::alpha(self.name());
        self.rule(rule)
    }

    pub fn alphanumeric(self) -> Self {
        let rule = rules::alphanumeric(self.name());
        self.rule(rule)
    }

    /// Any of UUID v1/v3/v4/v5
    pub fn uuid(self) -> Self {
        let rule = rules::uuid(self.name(), None);
        self.rule(rule)
    }

    pub fn uuid_version(self, version: UuidVersion) -> Self {
        let rule = rules::uuid(self.name(), Some(version));
        self.rule(rule)
    }

    pub fn with(self, other: impl Into<String>) -> Self {
        let rule = rules::with(self.name(), other);
        self.rule(rule)
    }

    pub fn without(self, other: impl Into<String>) -> Self {
        let rule = rules::without(self.name(), other);
        self.rule(rule)
    }

    /// User predicate over the value
    pub fn validate<F>(self, predicate: F, message: impl Into<Message>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let rule = rules::validate(self.name(), predicate, message);
        self.rule(rule)
    }

    /// User predicate over the value and the partially bound instance
    pub fn validate_with<F>(self, predicate: F, message: impl Into<Message>) -> Self
    where
        F: Fn(&Value, Option<&Instance>) -> bool + Send + Sync + 'static,
    {
        let rule = rules::validate_with(self.name(), predicate, message);
        self.rule(rule)
    }

    /// Attach a prebuilt rule to this field
    pub fn add_rule(self, rule: ValidatorRule) -> Self {
        let rule = rule.for_field(self.name());
        self.rule(rule)
    }

    /// Replace the message of the most recently added rule
    pub fn message(mut self, message: impl Into<Message>) -> Self {
        match self.descriptor.validators.pop() {
            Some(rule) => {
                self.descriptor.validators.push(rule.with_message(message));
                self
            }
            None => {
                let text = format!("field '{}' has no rule to attach a message to", self.name());
                self.fail(text)
            }
        }
    }

    // Transformers

    /// Runs on the coerced value before validation
    pub fn transform<F>(mut self, transformer: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.descriptor.transformer = Some(Arc::new(transformer));
        self
    }

    /// Computes the field from the raw request
    pub fn request<F>(mut self, transformer: F) -> Self
    where
        F: Fn(&Request) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.descriptor.source = Source::Request;
        self.descriptor.request_transformer = Some(Arc::new(transformer));
        self
    }

    /// Computes the field from other fields once they are bound
    pub fn virtual_field<I, S, F>(mut self, computed_fields: I, transformer: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Instance) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.descriptor.source = Source::Virtual;
        self.descriptor.computed_fields = computed_fields.into_iter().map(Into::into).collect();
        self.descriptor.virtual_transformer = Some(Arc::new(transformer));
        self
    }
}
