//! Enum definitions and enum coercion
//!
//! An [`EnumDef`] is an ordered list of `(key, value)` variants. Inputs may
//! name a variant by key (`"ADMIN"`) or by value (`"admin"`, `0`, `"0"`); the
//! coercion maps either form onto the variant's value and leaves anything
//! else untouched for the membership rule to reject.

use crate::coercion::parse_number;
use crate::validator::{Message, RuleKind, ValidatorRule};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of an enum variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Int(i64),
    Str(String),
}

impl EnumValue {
    pub fn to_value(&self) -> Value {
        match self {
            EnumValue::Int(n) => Value::from(*n),
            EnumValue::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumValue::Int(n) => write!(f, "{}", n),
            EnumValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EnumValue {
    fn from(n: i64) -> Self {
        EnumValue::Int(n)
    }
}

impl From<i32> for EnumValue {
    fn from(n: i32) -> Self {
        EnumValue::Int(i64::from(n))
    }
}

impl From<&str> for EnumValue {
    fn from(s: &str) -> Self {
        EnumValue::Str(s.to_string())
    }
}

impl From<String> for EnumValue {
    fn from(s: String) -> Self {
        EnumValue::Str(s)
    }
}

/// A named, ordered set of enum variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    name: String,
    variants: Vec<(String, EnumValue)>,
}

impl EnumDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
        }
    }

    /// Numeric enum with values assigned from 0 in declaration order
    pub fn numeric<I, S>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        keys.into_iter()
            .enumerate()
            .fold(Self::new(name), |def, (i, key)| def.variant(key, i as i64))
    }

    /// Add a variant
    pub fn variant(mut self, key: impl Into<String>, value: impl Into<EnumValue>) -> Self {
        self.variants.push((key.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &[(String, EnumValue)] {
        &self.variants
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &EnumValue> {
        self.variants.iter().map(|(_, value)| value)
    }

    pub fn value_of(&self, key: &str) -> Option<&EnumValue> {
        self.variants
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Whether an input names a variant by key or by value, compared as strings
    pub fn accepts(&self, input: &Value) -> bool {
        let input = input.to_string();
        self.variants
            .iter()
            .any(|(key, value)| *key == input || value.to_string() == input)
    }

    /// Map a key or value onto the variant's value; anything else passes through
    pub fn coerce(&self, raw: Value) -> Value {
        if raw.is_nullish() {
            return raw;
        }

        if let Some(value) = raw.as_str().and_then(|key| self.value_of(key)) {
            return value.to_value();
        }

        let comparable = match raw.as_str().and_then(parse_number) {
            Some(n) => Value::Number(n),
            None => raw.clone(),
        };
        if self.values().any(|value| value.to_value() == comparable) {
            return comparable;
        }

        raw
    }

    /// Membership rule listing every value in declaration order
    pub fn membership_rule(&self, field: impl Into<String>) -> ValidatorRule {
        let values = self
            .values()
            .map(EnumValue::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let def = self.clone();
        ValidatorRule::new(
            field,
            RuleKind::Enum,
            move |value, _| def.accepts(value),
            Message::dynamic(move |f, _| format!("{f} must be one of: {values}")),
        )
    }
}
