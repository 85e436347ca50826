//! Request data and per-source lookup
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

use crate::metadata::Source;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// The raw request handed to binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub path: String,
    /// Header names as received
    pub headers: Map<String, JsonValue>,
    pub body: JsonValue,
    pub query: JsonValue,
    /// Path parameters
    pub params: JsonValue,
    pub session: JsonValue,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            path: "/".to_string(),
            headers: Map::new(),
            body: JsonValue::Null,
            query: JsonValue::Object(Map::new()),
            params: JsonValue::Object(Map::new()),
            session: JsonValue::Null,
        }
    }
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_ignore_case(&self.headers, name).and_then(JsonValue::as_str)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(JsonValue::as_str)
    }
}

fn lookup_ignore_case<'a>(map: &'a Map<String, JsonValue>, name: &str) -> Option<&'a JsonValue> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn insert_into(slot: &mut JsonValue, key: String, value: JsonValue) {
    if !slot.is_object() {
        *slot = JsonValue::Object(Map::new());
    }
    if let JsonValue::Object(map) = slot {
        map.insert(key, value);
    }
}

/// Fluent construction of a [`Request`]
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.request.method = method.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.path = path.into();
        self
    }

    pub fn body(mut self, body: JsonValue) -> Self {
        self.request.body = body;
        self
    }

    /// Replace the whole query object
    pub fn query(mut self, query: JsonValue) -> Self {
        self.request.query = query;
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        insert_into(&mut self.request.query, key.into(), JsonValue::String(value.into()));
        self
    }

    /// Add a path parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        insert_into(&mut self.request.params, key.into(), JsonValue::String(value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request
            .headers
            .insert(name.into(), JsonValue::String(value.into()));
        self
    }

    pub fn session(mut self, session: JsonValue) -> Self {
        self.request.session = session;
        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}

/// One raw slot per lookup source plus the request they came from
///
/// Nested binds get a derived bundle whose slot for the declaring field's
/// source is replaced by the nested raw object.
#[derive(Debug, Clone)]
pub struct SourceBundle {
    body: Arc<JsonValue>,
    query: Arc<JsonValue>,
    params: Arc<JsonValue>,
    headers: Arc<JsonValue>,
    session: Arc<JsonValue>,
    request: Arc<Request>,
}

impl SourceBundle {
    pub fn new(request: Request) -> Self {
        Self::from_shared(Arc::new(request))
    }

    pub fn from_shared(request: Arc<Request>) -> Self {
        Self {
            body: Arc::new(request.body.clone()),
            query: Arc::new(request.query.clone()),
            params: Arc::new(request.params.clone()),
            headers: Arc::new(JsonValue::Object(request.headers.clone())),
            session: Arc::new(request.session.clone()),
            request,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn shared_request(&self) -> Arc<Request> {
        Arc::clone(&self.request)
    }

    /// Raw slot of a lookup source
    pub fn slot(&self, source: Source) -> Option<&JsonValue> {
        match source {
            Source::Body => Some(self.body.as_ref()),
            Source::Query => Some(self.query.as_ref()),
            Source::Params => Some(self.params.as_ref()),
            Source::Header => Some(self.headers.as_ref()),
            Source::Session => Some(self.session.as_ref()),
            Source::Request | Source::Virtual | Source::None => None,
        }
    }

    /// Raw value at `key` in a source; header names match case-insensitively
    pub fn lookup(&self, source: Source, key: &str) -> Option<&JsonValue> {
        let slot = self.slot(source)?.as_object()?;
        match source {
            Source::Header => lookup_ignore_case(slot, key),
            _ => slot.get(key),
        }
    }

    /// Copy of the bundle with one slot replaced
    pub fn with_slot(&self, source: Source, raw: JsonValue) -> Self {
        let mut derived = self.clone();
        let raw = Arc::new(raw);
        match source {
            Source::Body => derived.body = raw,
            Source::Query => derived.query = raw,
            Source::Params => derived.params = raw,
            Source::Header => derived.headers = raw,
            Source::Session => derived.session = raw,
            Source::Request | Source::Virtual | Source::None => {}
        }
        derived
    }
}

impl From<Request> for SourceBundle {
    fn from(request: Request) -> Self {
        SourceBundle::new(request)
    }
}
