//! Request binding
//!
//! - `source`: the raw request and per-source lookup
//! - `core`: the three-pass orchestrator
//!
//! Copyright (c) 2025 Stowage Team
//! Licensed under the Apache-2.0 license

pub mod core;
pub mod source;

#[cfg(test)]
mod tests;

pub use self::core::{BindOutcome, Binder};
pub use source::{Request, RequestBuilder, SourceBundle};
