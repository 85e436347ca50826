//! Process-wide validation error handler
//!
//! One handler can be installed at a time; installing replaces the previous
//! one. [`scoped_error_handler`] installs a handler until the returned guard
//! drops, then puts back whatever was installed before.
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

use crate::error::ValidationError;
use crate::middleware::{Outcome, RequestContext};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Turns a validation failure into a response, or passes it on
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &ValidationError, ctx: &RequestContext) -> Outcome;
}

impl<F> ErrorHandler for F
where
    F: Fn(&ValidationError, &RequestContext) -> Outcome + Send + Sync,
{
    fn handle(&self, error: &ValidationError, ctx: &RequestContext) -> Outcome {
        self(error, ctx)
    }
}

pub type SharedErrorHandler = Arc<dyn ErrorHandler>;

static ERROR_HANDLER: RwLock<Option<SharedErrorHandler>> = RwLock::new(None);

fn replace(handler: Option<SharedErrorHandler>) -> Option<SharedErrorHandler> {
    let mut slot = ERROR_HANDLER.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, handler)
}

/// Install a handler, returning the one it replaced
pub fn set_error_handler<H>(handler: H) -> Option<SharedErrorHandler>
where
    H: ErrorHandler + 'static,
{
    debug!("installing validation error handler");
    replace(Some(Arc::new(handler)))
}

/// Install an already shared handler
pub fn set_shared_error_handler(handler: SharedErrorHandler) -> Option<SharedErrorHandler> {
    replace(Some(handler))
}

/// The installed handler, if any
pub fn error_handler() -> Option<SharedErrorHandler> {
    ERROR_HANDLER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Remove the installed handler, returning it
pub fn clear_error_handler() -> Option<SharedErrorHandler> {
    replace(None)
}

/// Restores the previously installed handler on drop
#[must_use = "the handler is uninstalled as soon as the guard drops"]
pub struct ErrorHandlerGuard {
    previous: Option<SharedErrorHandler>,
}

impl Drop for ErrorHandlerGuard {
    fn drop(&mut self) {
        replace(self.previous.take());
    }
}

/// Install a handler until the guard drops
pub fn scoped_error_handler<H>(handler: H) -> ErrorHandlerGuard
where
    H: ErrorHandler + 'static,
{
    ErrorHandlerGuard {
        previous: set_error_handler(handler),
    }
}

/// Run `f` with a handler installed, restoring the previous one afterwards
pub fn with_error_handler<H, R, F>(handler: H, f: F) -> R
where
    H: ErrorHandler + 'static,
    F: FnOnce() -> R,
{
    let _guard = scoped_error_handler(handler);
    f()
}

/// Serializes unit tests that touch the global handler
#[cfg(test)]
pub(crate) static HANDLER_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
