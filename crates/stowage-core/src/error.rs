//! Error types for the Stowage core library
//!
//! Two families live here. [`Error`] is the crate-level error returned by
//! registration and binding calls. [`FieldError`] and [`ValidationError`] are
//! the structured report of a bind attempt: one entry per failing field, all
//! of them collected before anything is returned.

use crate::metadata::ClassId;
use crate::value::Instance;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Stowage operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid class or field registration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        class: Option<String>,
    },

    /// A class id that the registry never handed out
    #[error("Unknown class: {id}")]
    UnknownClass { id: ClassId },

    /// One or more fields failed to bind
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error scoped to a class
    pub fn configuration(message: impl Into<String>, class: Option<&str>) -> Self {
        Error::Configuration {
            message: message.into(),
            class: class.map(str::to_string),
        }
    }

    /// Borrow the validation report if this is a validation failure
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Distinguishes plain field failures from transformer failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// Presence, coercion or validator failure
    Field,
    /// A request/virtual transformer failed, or the field has nowhere to come from
    Transform,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldErrorKind::Field => write!(f, "FieldError"),
            FieldErrorKind::Transform => write!(f, "TransformFieldError"),
        }
    }
}

/// A single field that failed presence, type or rule checks
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Path-qualified field name (`address.zipCode`, `tags[2]`)
    pub field: String,
    /// Human-readable reason
    pub message: String,
    /// Error family
    pub kind: FieldErrorKind,
}

impl FieldError {
    /// Create a plain field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: FieldErrorKind::Field,
        }
    }

    /// Create a transformer error
    pub fn transform(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: FieldErrorKind::Transform,
        }
    }

    pub fn is_transform(&self) -> bool {
        self.kind == FieldErrorKind::Transform
    }
}

/// Aggregate report for one bind call; never empty
#[derive(Error, Debug, Clone, Serialize)]
pub struct ValidationError {
    errors: Vec<FieldError>,
    #[serde(skip)]
    partial: Option<Instance>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl ValidationError {
    /// Wrap a list of field errors; `None` when the list is empty
    pub fn from_errors(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self {
                errors,
                partial: None,
            })
        }
    }

    /// Attach the instance that was built despite the failures
    pub fn with_partial(mut self, instance: Instance) -> Self {
        self.partial = Some(instance);
        self
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// The instance as far as it could be bound
    pub fn partial(&self) -> Option<&Instance> {
        self.partial.as_ref()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Field paths in report order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.field.as_str())
    }

    /// First error reported for a path
    pub fn find(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}
