//! Binding orchestrator
//!
//! A bind walks the merged field list of a class three times:
//!
//! 1. request-derived fields, computed from the raw request
//! 2. source-declared fields, looked up, coerced, transformed and validated
//! 3. virtual fields, computed from the instance built by the first two passes
//!
//! Errors never short-circuit. Every failing field contributes to one report,
//! nested binds included, and the instance is always built as far as the
//! input allows.
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

use super::source::SourceBundle;
use crate::coercion::{self, NestedBinder};
use crate::config::BindConfig;
use crate::error::{FieldError, ValidationError};
use crate::metadata::{ClassId, FieldDescriptor, Registry, Source};
use crate::value::{Instance, Value};
use crate::{Error, Result};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, debug_span, trace, warn};

/// Binds request data against registered classes
#[derive(Debug, Clone)]
pub struct Binder<'r> {
    registry: &'r Registry,
    config: BindConfig,
}

/// Everything a bind produced, errors included
#[derive(Debug, Clone, PartialEq)]
pub struct BindOutcome {
    pub instance: Instance,
    pub errors: Vec<FieldError>,
}

impl BindOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The instance, or a validation error carrying the field errors
    pub fn into_result(self, keep_partial: bool) -> Result<Instance> {
        match ValidationError::from_errors(self.errors) {
            None => Ok(self.instance),
            Some(err) if keep_partial => Err(Error::Validation(err.with_partial(self.instance))),
            Some(err) => Err(Error::Validation(err)),
        }
    }
}

impl<'r> Binder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_config(registry, BindConfig::default())
    }

    pub fn with_config(registry: &'r Registry, config: BindConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Bind a class, failing with [`Error::Validation`] if any field failed
    pub fn bind(&self, class: ClassId, bundle: &SourceBundle) -> Result<Instance> {
        self.bind_outcome(class, bundle)?
            .into_result(self.config.collect_partial)
    }

    /// Bind a class and return the instance together with every field error
    ///
    /// Only registry problems (an unknown class) fail the call itself.
    pub fn bind_outcome(&self, class: ClassId, bundle: &SourceBundle) -> Result<BindOutcome> {
        let class_name = self.registry.class_name(class)?;
        let fields = self.registry.finalize(class)?;
        let span = debug_span!("bind", class = %class_name, fields = fields.len());
        let _enter = span.enter();

        let mut session = BindSession::new(self.registry, &self.config);
        let instance = session.bind_class(class, bundle, "", 0)?;
        if let Some(err) = session.fatal.take() {
            return Err(err);
        }

        debug!(errors = session.errors.len(), "bind finished");
        Ok(BindOutcome {
            instance,
            errors: session.errors,
        })
    }
}

/// State of one top-level bind
struct BindSession<'b> {
    registry: &'b Registry,
    config: &'b BindConfig,
    errors: Vec<FieldError>,
    /// Registry failure hit inside a nested bind
    fatal: Option<Error>,
}

/// Nested-bind context of the field being coerced
struct FieldScope<'s, 'b> {
    session: &'s mut BindSession<'b>,
    bundle: &'s SourceBundle,
    source: Source,
    depth: usize,
}

impl NestedBinder for FieldScope<'_, '_> {
    fn bind_nested(&mut self, class: ClassId, raw: &JsonValue, path: &str) -> Value {
        let depth = self.depth + 1;
        let max_depth = self.session.config.max_depth;
        if depth > max_depth {
            warn!(path, max_depth, "nesting depth exceeded");
            self.report(FieldError::new(
                path,
                format!("{path} exceeds maximum nesting depth of {max_depth}"),
            ));
            return Value::Null;
        }

        debug!(path, depth, "binding nested object");
        let derived = self.bundle.with_slot(self.source, raw.clone());
        match self.session.bind_class(class, &derived, path, depth) {
            Ok(instance) => Value::Object(instance),
            Err(err) => {
                if self.session.fatal.is_none() {
                    self.session.fatal = Some(err);
                }
                Value::Null
            }
        }
    }

    fn report(&mut self, error: FieldError) {
        self.session.errors.push(error);
    }
}

fn field_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Run a user transformer, turning errors and panics into a message
fn guarded<T, F>(f: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "transformer panicked".to_string())),
    }
}

impl<'b> BindSession<'b> {
    fn new(registry: &'b Registry, config: &'b BindConfig) -> Self {
        Self {
            registry,
            config,
            errors: Vec::new(),
            fatal: None,
        }
    }

    fn bind_class(
        &mut self,
        class: ClassId,
        bundle: &SourceBundle,
        prefix: &str,
        depth: usize,
    ) -> Result<Instance> {
        let registry = self.registry;
        let fields = registry.finalize(class)?;
        let mut instance = Instance::new(registry.class_name(class)?);

        let mut descriptors = Vec::with_capacity(fields.len());
        for name in fields.iter() {
            let descriptor = match registry.descriptor(class, name)? {
                Some(descriptor) => Cow::Borrowed(descriptor),
                None => Cow::Owned(FieldDescriptor::new(name.as_str())),
            };
            instance.insert(name.as_str(), Value::Undefined);
            descriptors.push(descriptor);
        }

        debug!(prefix, depth, "request-derived pass");
        for descriptor in descriptors.iter().filter(|d| d.is_request_derived()) {
            self.bind_request_field(descriptor, bundle, prefix, &mut instance);
        }

        debug!(prefix, depth, "source pass");
        for descriptor in descriptors.iter().filter(|d| d.is_source_declared()) {
            if self.bind_source_field(descriptor, bundle, prefix, depth, &mut instance) {
                // Cross-field rules see only the fields bound so far
                let path = field_path(prefix, &descriptor.name);
                let value = instance.get(&descriptor.name).clone();
                self.validate(descriptor, &path, &value, &instance);
            }
        }

        debug!(prefix, depth, "virtual pass");
        for descriptor in descriptors.iter().filter(|d| d.is_virtual()) {
            self.bind_virtual_field(descriptor, prefix, &mut instance);
        }

        Ok(instance)
    }

    fn bind_request_field(
        &mut self,
        descriptor: &FieldDescriptor,
        bundle: &SourceBundle,
        prefix: &str,
        instance: &mut Instance,
    ) {
        let Some(transformer) = descriptor.request_transformer.as_ref() else {
            return;
        };
        let path = field_path(prefix, &descriptor.name);
        let result = guarded(|| transformer(bundle.request()));
        self.assign_computed(descriptor, &path, result, instance);
    }

    fn bind_virtual_field(
        &mut self,
        descriptor: &FieldDescriptor,
        prefix: &str,
        instance: &mut Instance,
    ) {
        let Some(transformer) = descriptor.virtual_transformer.as_ref() else {
            return;
        };
        let path = field_path(prefix, &descriptor.name);
        trace!(path = %path, inputs = ?descriptor.computed_fields, "computing virtual field");
        let snapshot: &Instance = instance;
        let result = guarded(|| transformer(snapshot));
        self.assign_computed(descriptor, &path, result, instance);
    }

    /// Shared result handling for request-derived and virtual fields
    fn assign_computed(
        &mut self,
        descriptor: &FieldDescriptor,
        path: &str,
        result: std::result::Result<Value, String>,
        instance: &mut Instance,
    ) {
        match result {
            Err(cause) => {
                warn!(path, cause = %cause, "transformer failed");
                self.errors.push(FieldError::transform(
                    path,
                    format!("{path} transform failed: {cause}"),
                ));
            }
            Ok(value) if value.is_nullish() => self.assign_absent(descriptor, path, instance),
            Ok(value) => {
                instance.insert(descriptor.name.as_str(), value.clone());
                self.validate(descriptor, path, &value, instance);
            }
        }
    }

    /// Returns whether a value was assigned that still needs validation
    fn bind_source_field(
        &mut self,
        descriptor: &FieldDescriptor,
        bundle: &SourceBundle,
        prefix: &str,
        depth: usize,
        instance: &mut Instance,
    ) -> bool {
        let path = field_path(prefix, &descriptor.name);

        if !descriptor.source.is_lookup() {
            return self.bind_sourceless_field(descriptor, &path, instance);
        }

        if descriptor.key.is_empty() {
            self.errors
                .push(FieldError::new(path, "empty key is not allowed"));
            return false;
        }

        let raw = match bundle.lookup(descriptor.source, &descriptor.key) {
            Some(raw) if !raw.is_null() => raw,
            _ => {
                self.assign_absent(descriptor, &path, instance);
                return false;
            }
        };

        let coerced = match &descriptor.enum_type {
            Some(def) => Some(def.coerce(Value::from_json(raw))),
            None => {
                let mut scope = FieldScope {
                    session: &mut *self,
                    bundle,
                    source: descriptor.source,
                    depth,
                };
                coercion::coerce(descriptor.declared_type, raw, &path, &mut scope)
            }
        };

        let Some(value) = coerced else {
            // Keep what was sent so the partial instance shows it
            instance.insert(descriptor.name.as_str(), Value::from_json(raw));
            return false;
        };

        self.apply_transformer(descriptor, &path, value, instance)
    }

    /// A field with no lookup source can only come from its transformer
    fn bind_sourceless_field(
        &mut self,
        descriptor: &FieldDescriptor,
        path: &str,
        instance: &mut Instance,
    ) -> bool {
        let Some(transformer) = descriptor.transformer.as_ref() else {
            self.errors.push(FieldError::transform(
                path,
                format!("{path} has no source or transformer"),
            ));
            return false;
        };

        match guarded(|| transformer(Value::Undefined)) {
            Err(cause) => {
                warn!(path, cause = %cause, "transformer failed");
                self.errors.push(FieldError::transform(
                    path,
                    format!("{path} transform failed: {cause}"),
                ));
                false
            }
            Ok(value) if value.is_nullish() => {
                self.assign_absent(descriptor, path, instance);
                false
            }
            Ok(value) => {
                instance.insert(descriptor.name.as_str(), value);
                true
            }
        }
    }

    fn apply_transformer(
        &mut self,
        descriptor: &FieldDescriptor,
        path: &str,
        value: Value,
        instance: &mut Instance,
    ) -> bool {
        let Some(transformer) = descriptor.transformer.as_ref() else {
            instance.insert(descriptor.name.as_str(), value);
            return true;
        };

        let original = value.clone();
        match guarded(|| transformer(value)) {
            Ok(transformed) => {
                instance.insert(descriptor.name.as_str(), transformed);
                true
            }
            Err(cause) => {
                warn!(path, cause = %cause, "transformer failed");
                self.errors.push(FieldError::transform(
                    path,
                    format!("{path} transform failed: {cause}"),
                ));
                instance.insert(descriptor.name.as_str(), original);
                false
            }
        }
    }

    /// Missing value: default, else `Null` when optional, else required error
    fn assign_absent(&mut self, descriptor: &FieldDescriptor, path: &str, instance: &mut Instance) {
        if let Some(default) = &descriptor.default_value {
            instance.insert(descriptor.name.as_str(), default.clone());
        } else if descriptor.optional {
            instance.insert(descriptor.name.as_str(), Value::Null);
        } else {
            self.errors
                .push(FieldError::new(path, format!("{path} is required")));
        }
    }

    fn validate(
        &mut self,
        descriptor: &FieldDescriptor,
        path: &str,
        value: &Value,
        instance: &Instance,
    ) {
        for rule in &descriptor.validators {
            if let Some(error) = rule.validate_at(path, value, Some(instance)) {
                trace!(path, rule = %rule.kind(), "validator failed");
                self.errors.push(error);
            }
        }
    }
}
