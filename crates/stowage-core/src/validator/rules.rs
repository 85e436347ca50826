//! Built-in validator rules
//!
//! Every constructor takes the field the rule is attached to and returns a
//! [`ValidatorRule`] with its default message. Default messages are rendered
//! against the path the rule is checked at, so a rule on `zipCode` inside
//! `address` reports `address.zipCode must be ...`.
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

use super::patterns::{self, UuidVersion};
use super::types::{Message, RuleKind, ValidatorRule};
use crate::value::{format_number, Instance, Value};
use crate::{Error, Result};
use regex::Regex;

fn char_count(value: &Value) -> Option<usize> {
    value.as_str().map(|s| s.chars().count())
}

fn matches(regex: &Regex, value: &Value) -> bool {
    value.as_str().map(|s| regex.is_match(s)).unwrap_or(false)
}

/// Number greater than or equal to `minimum`
pub fn min(field: impl Into<String>, minimum: f64) -> ValidatorRule {
    let bound = format_number(minimum);
    ValidatorRule::new(
        field,
        RuleKind::Min,
        move |value, _| value.as_f64().map(|n| n >= minimum).unwrap_or(false),
        Message::dynamic(move |f, _| format!("{f} must be >= {bound}")),
    )
}

/// Number less than or equal to `maximum`
pub fn max(field: impl Into<String>, maximum: f64) -> ValidatorRule {
    let bound = format_number(maximum);
    ValidatorRule::new(
        field,
        RuleKind::Max,
        move |value, _| value.as_f64().map(|n| n <= maximum).unwrap_or(false),
        Message::dynamic(move |f, _| format!("{f} must be <= {bound}")),
    )
}

/// Number within `[low, high]`
pub fn range(field: impl Into<String>, low: f64, high: f64) -> ValidatorRule {
    let (lo, hi) = (format_number(low), format_number(high));
    ValidatorRule::new(
        field,
        RuleKind::Range,
        move |value, _| {
            value
                .as_f64()
                .map(|n| n >= low && n <= high)
                .unwrap_or(false)
        },
        Message::dynamic(move |f, _| format!("{f} must be between {lo} and {hi}")),
    )
}

/// Strict equality; `Null` and `Undefined` are distinct targets
pub fn equal(field: impl Into<String>, expected: impl Into<Value>) -> ValidatorRule {
    let expected = expected.into();
    let label = expected.to_string();
    ValidatorRule::new(
        field,
        RuleKind::Equal,
        move |value, _| *value == expected,
        Message::dynamic(move |f, _| format!("{f} must be equal to {label}")),
    )
}

/// Strict inequality
pub fn not_equal(field: impl Into<String>, unexpected: impl Into<Value>) -> ValidatorRule {
    let unexpected = unexpected.into();
    let label = unexpected.to_string();
    ValidatorRule::new(
        field,
        RuleKind::NotEqual,
        move |value, _| *value != unexpected,
        Message::dynamic(move |f, _| format!("{f} must not be equal to {label}")),
    )
}

pub fn prefix(field: impl Into<String>, text: impl Into<String>) -> ValidatorRule {
    let text = text.into();
    let label = text.clone();
    ValidatorRule::new(
        field,
        RuleKind::Prefix,
        move |value, _| value.as_str().map(|s| s.starts_with(&text)).unwrap_or(false),
        Message::dynamic(move |f, _| format!("{f} must start with {label}")),
    )
}

pub fn suffix(field: impl Into<String>, text: impl Into<String>) -> ValidatorRule {
    let text = text.into();
    let label = text.clone();
    ValidatorRule::new(
        field,
        RuleKind::Suffix,
        move |value, _| value.as_str().map(|s| s.ends_with(&text)).unwrap_or(false),
        Message::dynamic(move |f, _| format!("{f} must end with {label}")),
    )
}

/// String of exactly `count` characters
pub fn length(field: impl Into<String>, count: usize) -> ValidatorRule {
    ValidatorRule::new(
        field,
        RuleKind::Length,
        move |value, _| char_count(value) == Some(count),
        Message::dynamic(move |f, _| format!("{f} must be {count} characters")),
    )
}

pub fn min_length(field: impl Into<String>, count: usize) -> ValidatorRule {
    ValidatorRule::new(
        field,
        RuleKind::MinLength,
        move |value, _| char_count(value).map(|n| n >= count).unwrap_or(false),
        Message::dynamic(move |f, _| format!("{f} must be at least {count} characters")),
    )
}

pub fn max_length(field: impl Into<String>, count: usize) -> ValidatorRule {
    ValidatorRule::new(
        field,
        RuleKind::MaxLength,
        move |value, _| char_count(value).map(|n| n <= count).unwrap_or(false),
        Message::dynamic(move |f, _| format!("{f} must not exceed {count} characters")),
    )
}

/// Membership by equality; an empty list rejects everything
pub fn one_of(field: impl Into<String>, options: Vec<Value>) -> ValidatorRule {
    let label = options
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    ValidatorRule::new(
        field,
        RuleKind::OneOf,
        move |value, _| options.contains(value),
        Message::dynamic(move |f, _| format!("{f} must be one of {label}")),
    )
}

pub fn is_true(field: impl Into<String>) -> ValidatorRule {
    ValidatorRule::new(
        field,
        RuleKind::IsTrue,
        |value, _| value.as_bool() == Some(true),
        Message::dynamic(|f, _| format!("{f} must be true")),
    )
}

pub fn is_false(field: impl Into<String>) -> ValidatorRule {
    ValidatorRule::new(
        field,
        RuleKind::IsFalse,
        |value, _| value.as_bool() == Some(false),
        Message::dynamic(|f, _| format!("{f} must be false")),
    )
}

/// String matching a user pattern
pub fn regexp(field: impl Into<String>, pattern: &str) -> Result<ValidatorRule> {
    let field = field.into();
    let regex = Regex::new(pattern).map_err(|e| {
        Error::configuration(
            format!("invalid pattern for field '{}': {}", field, e),
            None,
        )
    })?;
    let label = pattern.to_string();
    Ok(ValidatorRule::new(
        field,
        RuleKind::Regexp,
        move |value, _| matches(&regex, value),
        Message::dynamic(move |f, _| format!("{f} does not match {label}")),
    ))
}

pub fn email(field: impl Into<String>) -> ValidatorRule {
    ValidatorRule::new(
        field,
        RuleKind::Email,
        |value, _| matches(patterns::email(), value),
        Message::dynamic(|f, _| format!("{f} must be a valid email address")),
    )
}

/// ASCII letters only
pub fn alpha(field: impl Into<String>) -> ValidatorRule {
    ValidatorRule::new(
        field,
        RuleKind::Alpha,
        |value, _| matches(patterns::alpha(), value),
        Message::dynamic(|f, _| format!("{f} should be alphabetic")),
    )
}

/// ASCII letters and digits only
pub fn alphanumeric(field: impl Into<String>) -> ValidatorRule {
    ValidatorRule::new(
        field,
        RuleKind::Alphanumeric,
        |value, _| matches(patterns::alphanumeric(), value),
        Message::dynamic(|f, _| format!("{f} should be alphanumeric")),
    )
}

/// UUID of one version, or of any of v1/v3/v4/v5 when `version` is `None`
pub fn uuid(field: impl Into<String>, version: Option<UuidVersion>) -> ValidatorRule {
    let accepted = match version {
        Some(version) => version.to_string(),
        None => "v1, v3, v4, or v5".to_string(),
    };
    ValidatorRule::new(
        field,
        RuleKind::Uuid,
        move |value, _| matches(patterns::uuid(version), value),
        Message::dynamic(move |f, _| format!("{f} must be a valid UUID format ({accepted})")),
    )
}

/// When the value is truthy, `other` must be truthy too
pub fn with(field: impl Into<String>, other: impl Into<String>) -> ValidatorRule {
    let other = other.into();
    let label = other.clone();
    ValidatorRule::new(
        field,
        RuleKind::With,
        move |value, instance: Option<&Instance>| {
            if !value.is_truthy() {
                return true;
            }
            instance
                .map(|instance| instance.get(&other).is_truthy())
                .unwrap_or(false)
        },
        Message::dynamic(move |f, _| format!("{f} requires {label}")),
    )
}

/// The value and `other` must not both be truthy; fails without an instance
pub fn without(field: impl Into<String>, other: impl Into<String>) -> ValidatorRule {
    let other = other.into();
    let label = other.clone();
    ValidatorRule::new(
        field,
        RuleKind::Without,
        move |value, instance: Option<&Instance>| match instance {
            Some(instance) => !(value.is_truthy() && instance.get(&other).is_truthy()),
            None => false,
        },
        Message::dynamic(move |f, _| format!("{f} cannot exist with {label}")),
    )
}

/// User predicate over the value
pub fn validate<F>(field: impl Into<String>, predicate: F, message: impl Into<Message>) -> ValidatorRule
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    ValidatorRule::new(field, RuleKind::Custom, move |value, _| predicate(value), message)
}

/// User predicate that can also read the partially bound instance
pub fn validate_with<F>(
    field: impl Into<String>,
    predicate: F,
    message: impl Into<Message>,
) -> ValidatorRule
where
    F: Fn(&Value, Option<&Instance>) -> bool + Send + Sync + 'static,
{
    ValidatorRule::new(field, RuleKind::Custom, predicate, message)
}
