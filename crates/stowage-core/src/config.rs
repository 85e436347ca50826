//! Binding configuration
//!
//! Loaded from defaults, optionally a JSON document, then environment
//! overrides:
//! - `STOWAGE_MAX_DEPTH`
//! - `STOWAGE_ERROR_STATUS`
//! - `STOWAGE_ERROR_MESSAGE`

use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ENV_MAX_DEPTH: &str = "STOWAGE_MAX_DEPTH";
pub const ENV_ERROR_STATUS: &str = "STOWAGE_ERROR_STATUS";
pub const ENV_ERROR_MESSAGE: &str = "STOWAGE_ERROR_MESSAGE";

/// Settings shared by every bind of a [`Binder`](crate::Binder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Deepest allowed nested-object recursion
    pub max_depth: usize,

    /// Status of the default validation error response
    pub error_status: u16,

    /// Top-level message of the default validation error response
    pub error_message: String,

    /// Keep the partially bound instance in validation errors
    pub collect_partial: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            error_status: 400,
            error_message: "Validation failed".to_string(),
            collect_partial: true,
        }
    }
}

impl BindConfig {
    /// Parse from JSON; missing keys keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_with_env();
        config
    }

    /// Apply environment overrides; invalid values are ignored
    pub fn merge_with_env(&mut self) {
        self.merge_with(|name| std::env::var(name).ok());
    }

    fn merge_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(depth) = lookup(ENV_MAX_DEPTH) {
            match depth.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => self.max_depth = depth,
                _ => warn!("Invalid {}: {}, using {}", ENV_MAX_DEPTH, depth, self.max_depth),
            }
        }

        if let Some(status) = lookup(ENV_ERROR_STATUS) {
            match status.trim().parse::<u16>() {
                Ok(status) if (100..=599).contains(&status) => self.error_status = status,
                _ => warn!("Invalid {}: {}, using {}", ENV_ERROR_STATUS, status, self.error_status),
            }
        }

        if let Some(message) = lookup(ENV_ERROR_MESSAGE) {
            if message.is_empty() {
                warn!("Empty {}, using default", ENV_ERROR_MESSAGE);
            } else {
                self.error_message = message;
            }
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_error_status(mut self, status: u16) -> Self {
        self.error_status = status;
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn with_collect_partial(mut self, collect: bool) -> Self {
        self.collect_partial = collect;
        self
    }
}
