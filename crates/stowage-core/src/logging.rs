//! Tracing subscriber setup for hosts that want one
//!
//! The library only emits `tracing` events; nothing is printed unless the
//! host installs a subscriber. [`subscriber`] builds one without installing
//! it, [`init_logging`] installs it globally.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_FORMAT: &str = "STOWAGE_LOG_FORMAT";

pub type BoxedSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base filter, in `EnvFilter` syntax
    pub level: String,
    pub format: LogFormat,
    /// Colored output; never applied to json
    pub ansi: bool,
    /// Per-module levels, e.g. `stowage_core::binding = trace`
    pub module_filter: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Full,
    Json,
}

impl LogFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "compact" => Some(LogFormat::Compact),
            "full" => Some(LogFormat::Full),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            ansi: true,
            module_filter: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Apply `RUST_LOG` and `STOWAGE_LOG_FORMAT`
    pub fn merge_with_env(&mut self) {
        self.merge_with(|name| std::env::var(name).ok());
    }

    fn merge_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rust_log) = lookup("RUST_LOG") {
            self.level = rust_log;
        }

        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            match LogFormat::parse(&format) {
                Some(format) => self.format = format,
                None => tracing::warn!("Invalid log format: {}, using default", format),
            }
        }
    }

    pub fn with_module_level(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.module_filter.insert(module.into(), level.into());
        self
    }
}

/// Build a `fmt` subscriber for `config` without installing it
pub fn subscriber(config: &LoggingConfig) -> Result<BoxedSubscriber> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(create_env_filter(config)?)
        .with_target(true)
        .with_ansi(config.ansi && config.format != LogFormat::Json);

    Ok(match config.format {
        LogFormat::Compact => Box::new(builder.compact().finish()),
        LogFormat::Full => Box::new(builder.finish()),
        LogFormat::Json => Box::new(builder.json().finish()),
    })
}

/// Install the global subscriber; fails if one is already installed
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    tracing::subscriber::set_global_default(subscriber(&config)?).map_err(|err| {
        Error::configuration(format!("Failed to initialize logging: {}", err), None)
    })?;
    tracing::debug!(config = ?config, "Logging system initialized");
    Ok(())
}

fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let invalid =
        |e: &dyn std::fmt::Display| Error::configuration(format!("Invalid filter directive: {}", e), None);

    let mut filter = EnvFilter::try_new(&config.level).map_err(|e| invalid(&e))?;
    for (module, level) in &config.module_filter {
        let directive = format!("{}={}", module, level).parse().map_err(|e| invalid(&e))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            [("RUST_LOG", "stowage_core=trace"), (ENV_LOG_FORMAT, "JSON")]
                .into_iter()
                .collect();

        let mut config = LoggingConfig::default();
        config.merge_with(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.level, "stowage_core=trace");
        assert_eq!(config.format, LogFormat::Json);

        let mut config = LoggingConfig::default();
        config.merge_with(|name| (name == ENV_LOG_FORMAT).then(|| "xml".to_string()));
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn test_module_filter_directives() {
        let config = LoggingConfig::default().with_module_level("stowage_core::binding", "trace");
        assert!(create_env_filter(&config).is_ok());

        let config = LoggingConfig::default().with_module_level("stowage_core", "loud");
        assert!(matches!(
            create_env_filter(&config),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_subscriber_per_format() {
        for format in [LogFormat::Compact, LogFormat::Full, LogFormat::Json] {
            let config = LoggingConfig { format, ..LoggingConfig::default() };
            let subscriber = subscriber(&config).unwrap();
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(?format, "scoped subscriber");
            });
        }

        let config = LoggingConfig { level: "stowage_core=loud".to_string(), ..LoggingConfig::default() };
        assert!(matches!(subscriber(&config), Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_config_from_json() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"level": "debug", "format": "full"}"#).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.ansi);
    }
}
