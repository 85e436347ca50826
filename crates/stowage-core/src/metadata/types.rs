//! Field metadata types
//!
//! A [`FieldDescriptor`] is everything the binder needs to know about one
//! field: where its raw value comes from, what it should be coerced into,
//! which rules it must satisfy and which transformers run on it.
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

use crate::binding::Request;
use crate::enum_type::EnumDef;
use crate::validator::{RuleKind, ValidatorRule};
use crate::value::{Instance, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Registry handle for a class description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub(crate) usize);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a field's raw value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Body,
    Query,
    /// Path parameters
    Params,
    /// Case-insensitive header lookup
    Header,
    Session,
    /// Computed from the raw request by a request transformer
    Request,
    /// Computed from the other fields of the instance
    Virtual,
    /// Declared without an origin
    None,
}

impl Source {
    /// Sources that are resolved by key lookup in a bundle slot
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Source::Body | Source::Query | Source::Params | Source::Header | Source::Session
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Body => "body",
            Source::Query => "query",
            Source::Params => "params",
            Source::Header => "header",
            Source::Session => "session",
            Source::Request => "request",
            Source::Virtual => "virtual",
            Source::None => "none",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Element type of an array field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    String,
    Number,
    Boolean,
    Date,
    Object(ClassId),
}

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// No coercion; the raw value is kept as given
    #[default]
    Any,
    String,
    Number,
    Boolean,
    Date,
    Object(ClassId),
    Array(Option<ElementType>),
}

impl From<ElementType> for FieldType {
    fn from(element: ElementType) -> Self {
        match element {
            ElementType::String => FieldType::String,
            ElementType::Number => FieldType::Number,
            ElementType::Boolean => FieldType::Boolean,
            ElementType::Date => FieldType::Date,
            ElementType::Object(class) => FieldType::Object(class),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Any => write!(f, "any"),
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Date => write!(f, "date"),
            FieldType::Object(class) => write!(f, "object({})", class),
            FieldType::Array(None) => write!(f, "array"),
            FieldType::Array(Some(element)) => write!(f, "array({})", FieldType::from(*element)),
        }
    }
}

/// Post-coercion value transformer
pub type Transformer = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

/// Computes a field from the raw request
pub type RequestTransformer = Arc<dyn Fn(&Request) -> anyhow::Result<Value> + Send + Sync>;

/// Computes a field from the instance bound so far
pub type VirtualTransformer = Arc<dyn Fn(&Instance) -> anyhow::Result<Value> + Send + Sync>;

/// Per-field metadata record
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Field name on the bound instance
    pub name: String,
    /// Lookup name inside the source slot
    pub key: String,
    pub source: Source,
    pub declared_type: FieldType,
    pub enum_type: Option<Arc<EnumDef>>,
    pub optional: bool,
    /// Used when the raw value is absent; wins over `optional`
    pub default_value: Option<Value>,
    pub validators: Vec<ValidatorRule>,
    pub transformer: Option<Transformer>,
    pub request_transformer: Option<RequestTransformer>,
    pub virtual_transformer: Option<VirtualTransformer>,
    /// Fields a virtual transformer reads
    pub computed_fields: Vec<String>,
}

impl FieldDescriptor {
    /// Fresh descriptor: body source, required, untyped, no rules
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            source: Source::Body,
            declared_type: FieldType::Any,
            enum_type: None,
            optional: false,
            default_value: None,
            validators: Vec::new(),
            transformer: None,
            request_transformer: None,
            virtual_transformer: None,
            computed_fields: Vec::new(),
        }
    }

    pub fn is_request_derived(&self) -> bool {
        self.request_transformer.is_some()
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_transformer.is_some()
    }

    /// Neither request-derived nor virtual
    pub fn is_source_declared(&self) -> bool {
        !self.is_request_derived() && !self.is_virtual()
    }

    /// First validator of a given kind
    pub fn rule(&self, kind: RuleKind) -> Option<&ValidatorRule> {
        self.validators.iter().find(|rule| rule.kind() == kind)
    }

    /// Check the single-transformer invariant
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.request_transformer.is_some() && self.virtual_transformer.is_some() {
            return Err(format!(
                "field '{}' cannot have both a request and a virtual transformer",
                self.name
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("source", &self.source)
            .field("declared_type", &self.declared_type)
            .field("enum_type", &self.enum_type.as_ref().map(|e| e.name().to_string()))
            .field("optional", &self.optional)
            .field("default_value", &self.default_value)
            .field("validators", &self.validators)
            .field("transformer", &self.transformer.is_some())
            .field("request_transformer", &self.request_transformer.is_some())
            .field("virtual_transformer", &self.virtual_transformer.is_some())
            .field("computed_fields", &self.computed_fields)
            .finish()
    }
}
