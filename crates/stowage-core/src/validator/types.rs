//! Core validator types
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

use crate::error::FieldError;
use crate::value::{Instance, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Rule family, used for lookup and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Min,
    Max,
    Range,
    Equal,
    NotEqual,
    Prefix,
    Suffix,
    Length,
    MinLength,
    MaxLength,
    OneOf,
    IsTrue,
    IsFalse,
    Regexp,
    Email,
    Alpha,
    Alphanumeric,
    Uuid,
    With,
    Without,
    Enum,
    /// User supplied predicate
    Custom,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::Range => "range",
            RuleKind::Equal => "equal",
            RuleKind::NotEqual => "not_equal",
            RuleKind::Prefix => "prefix",
            RuleKind::Suffix => "suffix",
            RuleKind::Length => "length",
            RuleKind::MinLength => "min_length",
            RuleKind::MaxLength => "max_length",
            RuleKind::OneOf => "one_of",
            RuleKind::IsTrue => "is_true",
            RuleKind::IsFalse => "is_false",
            RuleKind::Regexp => "regexp",
            RuleKind::Email => "email",
            RuleKind::Alpha => "alpha",
            RuleKind::Alphanumeric => "alphanumeric",
            RuleKind::Uuid => "uuid",
            RuleKind::With => "with",
            RuleKind::Without => "without",
            RuleKind::Enum => "enum",
            RuleKind::Custom => "custom",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule predicate; the instance is the partially bound record, when there is one
pub type Predicate = Arc<dyn Fn(&Value, Option<&Instance>) -> bool + Send + Sync>;

/// Builds a message from the field path and the offending value
pub type MessageFn = Arc<dyn Fn(&str, &Value) -> String + Send + Sync>;

/// Failure message of a rule
#[derive(Clone)]
pub enum Message {
    Static(String),
    Dynamic(MessageFn),
}

impl Message {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&str, &Value) -> String + Send + Sync + 'static,
    {
        Message::Dynamic(Arc::new(f))
    }

    pub fn render(&self, field: &str, value: &Value) -> String {
        match self {
            Message::Static(text) => text.clone(),
            Message::Dynamic(f) => f(field, value),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Static(text) => f.debug_tuple("Static").field(text).finish(),
            Message::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Static(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Static(text)
    }
}

/// A single check attached to a field
#[derive(Clone)]
pub struct ValidatorRule {
    field: String,
    kind: RuleKind,
    predicate: Predicate,
    message: Message,
}

impl ValidatorRule {
    pub fn new<F>(
        field: impl Into<String>,
        kind: RuleKind,
        predicate: F,
        message: impl Into<Message>,
    ) -> Self
    where
        F: Fn(&Value, Option<&Instance>) -> bool + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            kind,
            predicate: Arc::new(predicate),
            message: message.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Replace the failure message
    pub fn with_message(mut self, message: impl Into<Message>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the rule to another field name
    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn is_valid(&self, value: &Value, instance: Option<&Instance>) -> bool {
        (self.predicate)(value, instance)
    }

    /// Check a value against the rule, reporting under the rule's own field
    pub fn validate(&self, value: &Value, instance: Option<&Instance>) -> Option<FieldError> {
        self.validate_at(&self.field, value, instance)
    }

    /// Check a value, reporting under a path-qualified field name
    pub fn validate_at(
        &self,
        path: &str,
        value: &Value,
        instance: Option<&Instance>,
    ) -> Option<FieldError> {
        if self.is_valid(value, instance) {
            None
        } else {
            Some(FieldError::new(path, self.message.render(path, value)))
        }
    }
}

impl fmt::Debug for ValidatorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRule")
            .field("field", &self.field)
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}
