//! Type coercion engine
//!
//! Turns a raw JSON value into a [`Value`] of the declared [`FieldType`].
//! Failures are reported through the [`NestedBinder`] passed in, which also
//! handles recursion into nested classes, so one call can report several
//! errors (one per bad array element, or everything a nested bind found).
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

use crate::error::FieldError;
use crate::metadata::{ClassId, FieldType};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

/// Callback into the binder for nested classes and error reporting
pub trait NestedBinder {
    /// Bind a raw object as an instance of `class` at `path`
    fn bind_nested(&mut self, class: ClassId, raw: &JsonValue, path: &str) -> Value;

    /// Record a coercion failure
    fn report(&mut self, error: FieldError);
}

/// Coerce a raw value; `None` when it could not be coerced (already reported)
pub fn coerce(
    ty: FieldType,
    raw: &JsonValue,
    path: &str,
    binder: &mut dyn NestedBinder,
) -> Option<Value> {
    match ty {
        FieldType::Any => Some(Value::from_json(raw)),
        FieldType::String => Some(Value::String(to_string(raw))),
        FieldType::Boolean => Some(Value::Bool(to_bool(raw))),
        FieldType::Number => match to_number(raw) {
            Some(n) => Some(Value::Number(n)),
            None => {
                binder.report(FieldError::new(path, format!("{path} must be a valid number")));
                None
            }
        },
        FieldType::Date => match to_date(raw) {
            Some(date) => Some(Value::Date(date)),
            None => {
                binder.report(FieldError::new(path, format!("{path} must be a valid date")));
                None
            }
        },
        FieldType::Object(class) => {
            if raw.is_object() {
                Some(binder.bind_nested(class, raw, path))
            } else {
                binder.report(FieldError::new(path, format!("{path} must be an object")));
                None
            }
        }
        FieldType::Array(element) => {
            let Some(items) = raw.as_array() else {
                binder.report(FieldError::new(path, format!("{path} must be an array")));
                return None;
            };

            let element_type = element.map(FieldType::from).unwrap_or_default();
            let coerced = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    coerce(element_type, item, &format!("{path}[{i}]"), &mut *binder)
                })
                .collect();
            Some(Value::Array(coerced))
        }
    }
}

/// String rendering of a raw value
pub fn to_string(raw: &JsonValue) -> String {
    match raw {
        JsonValue::String(s) => s.clone(),
        other => Value::from_json(other).to_string(),
    }
}

/// `true` only for `true` and `"true"`
pub fn to_bool(raw: &JsonValue) -> bool {
    match raw {
        JsonValue::Bool(b) => *b,
        JsonValue::String(s) => s == "true",
        _ => false,
    }
}

pub fn to_number(raw: &JsonValue) -> Option<f64> {
    match raw {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => parse_number(s),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Numeric string parsing: decimal, exponent, `0x`/`0o`/`0b` and `Infinity`
///
/// Blank strings and anything that does not parse as a whole are rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .ok()
            .map(|n| n as f64);
    }

    // Rust also accepts "inf" and "nan", which are not numbers here
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }

    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

pub fn to_date(raw: &JsonValue) -> Option<DateTime<Utc>> {
    match raw {
        JsonValue::String(s) => parse_date(s),
        JsonValue::Number(n) => n
            .as_f64()
            .filter(|ms| ms.is_finite())
            .and_then(|ms| DateTime::from_timestamp_millis(ms.trunc() as i64)),
        _ => None,
    }
}

/// RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC) or `YYYY-MM-DD` (midnight UTC)
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
