//! Request-pipeline glue
//!
//! [`bind_request`] binds a class against a [`RequestContext`] and stores the
//! instance in the context. [`handle_error`] is the error stage: validation
//! failures go to the installed handler or become the default JSON response,
//! everything else is passed on untouched.
//!
//! ```
//! use serde_json::json;
//! use stowage_core::middleware::{bind_request, handle_error, Outcome, RequestContext};
//! use stowage_core::{Binder, Registry, Request};
//!
//! let mut registry = Registry::new();
//! let login = registry
//!     .class("Login")
//!     .field("email", |f| f.body().string().email())
//!     .build()
//!     .unwrap();
//!
//! let binder = Binder::new(&registry);
//! let mut ctx = RequestContext::new(Request::builder().body(json!({})).build());
//!
//! let err = bind_request(&binder, login, &mut ctx).unwrap_err();
//! match handle_error(err, &ctx) {
//!     Outcome::Respond(response) => assert_eq!(response.status, 400),
//!     Outcome::Next(_) => unreachable!(),
//! }
//! ```

use crate::binding::{Binder, Request, SourceBundle};
use crate::config::BindConfig;
use crate::error::ValidationError;
use crate::handler::error_handler;
use crate::metadata::ClassId;
use crate::value::Instance;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::debug;

/// Per-request state carried through the pipeline
#[derive(Debug, Clone)]
pub struct RequestContext {
    request: Arc<Request>,
    bound: Option<Instance>,
    config: BindConfig,
}

impl RequestContext {
    pub fn new(request: Request) -> Self {
        Self {
            request: Arc::new(request),
            bound: None,
            config: BindConfig::default(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Settings of the binder that last ran on this context
    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// The bound instance, once binding succeeded
    pub fn bound(&self) -> Option<&Instance> {
        self.bound.as_ref()
    }

    /// The bound instance deserialized into a caller type
    pub fn bound_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.bound.as_ref().map(Instance::deserialize::<T>).transpose()
    }

    pub fn take_bound(&mut self) -> Option<Instance> {
        self.bound.take()
    }
}

/// Bind `class` from the context's request and keep the instance on success
pub fn bind_request(binder: &Binder<'_>, class: ClassId, ctx: &mut RequestContext) -> Result<()> {
    ctx.config = binder.config().clone();
    let bundle = SourceBundle::from_shared(Arc::clone(&ctx.request));
    let instance = binder.bind(class, &bundle)?;
    ctx.bound = Some(instance);
    Ok(())
}

/// Response produced by the error stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: JsonValue,
}

impl Response {
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self { status, body }
    }
}

/// Result of the error stage
#[derive(Debug)]
pub enum Outcome {
    /// Respond to the client
    Respond(Response),
    /// Hand the error to the next collaborator
    Next(Error),
}

impl Outcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Outcome::Respond(response) => Some(response),
            Outcome::Next(_) => None,
        }
    }

    pub fn into_error(self) -> Option<Error> {
        match self {
            Outcome::Respond(_) => None,
            Outcome::Next(err) => Some(err),
        }
    }
}

/// Default response: configured status with every field error listed
pub fn default_response(error: &ValidationError, config: &BindConfig) -> Response {
    let errors = error
        .errors()
        .iter()
        .map(|e| json!({ "name": e.field, "message": e.message }))
        .collect::<Vec<_>>();
    Response::new(
        config.error_status,
        json!({ "message": config.error_message, "errors": errors }),
    )
}

/// Route an error: handler or default response for validation failures
pub fn handle_error(err: Error, ctx: &RequestContext) -> Outcome {
    let Error::Validation(validation) = err else {
        return Outcome::Next(err);
    };

    match error_handler() {
        Some(handler) => {
            debug!(errors = validation.len(), "dispatching to installed error handler");
            handler.handle(&validation, ctx)
        }
        None => Outcome::Respond(default_response(&validation, ctx.config())),
    }
}
