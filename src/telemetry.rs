//! Telemetry and tracing utilities
//!
//! The library only emits `tracing` events under `alchemy::*` targets.
//! Applications that have no subscriber of their own can install one here.
//!
//! ```rust,ignore
//! use alchemy::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! init_subscriber(SubscriberConfig::builder().log_level(tracing::Level::DEBUG).build())?;
//! // or, driven by ALCHEMY_LOG_LEVEL / ALCHEMY_LOG_FORMAT
//! alchemy::telemetry::init_from_env()?;
//! ```

use std::str::FromStr;

use crate::error::AlchemyError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON, one object per event
    Json,
    /// JSON with event fields flattened to the top level
    JsonCompact,
}

impl FromStr for OutputFormat {
    type Err = AlchemyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(AlchemyError::ConfigurationError(format!(
                "Invalid log format: {s}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

/// Configuration for the tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Debug level, text output.
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            output_format: OutputFormat::Text,
        }
    }
}

/// Builder for [`SubscriberConfig`]
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string (`trace` .. `error`).
    pub fn log_level_str(mut self, level: &str) -> Result<Self, AlchemyError> {
        let parsed = tracing::Level::from_str(level.trim()).map_err(|_| {
            AlchemyError::ConfigurationError(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        self.log_level = Some(parsed);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
        }
    }
}

fn filter_directive(level: tracing::Level) -> String {
    format!("alchemy={}", level.as_str().to_lowercase())
}

/// Install a global `fmt` subscriber filtered to `alchemy=<level>`.
///
/// An already-installed global subscriber is left in place and is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<(), AlchemyError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }
    let filter = filter_directive(config.log_level);

    let init_result = match config.output_format {
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .try_init(),
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    match init_result {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_msg = e.to_string();
            // `try_init` also installs the `log` bridge, which fails the same way.
            if error_msg.contains("global default trace dispatcher has already been set")
                || error_msg.contains("logging system was already initialized")
            {
                Ok(())
            } else {
                Err(AlchemyError::ConfigurationError(format!(
                    "Failed to initialize tracing: {e}"
                )))
            }
        }
    }
}

/// Build a [`SubscriberConfig`] from `ALCHEMY_LOG_LEVEL` and `ALCHEMY_LOG_FORMAT`.
pub fn config_from_env() -> Result<SubscriberConfig, AlchemyError> {
    let mut builder = SubscriberConfig::builder();
    if let Ok(level) = std::env::var("ALCHEMY_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }
    if let Ok(format) = std::env::var("ALCHEMY_LOG_FORMAT") {
        builder = builder.output_format(format.parse()?);
    }
    Ok(builder.build())
}

/// Initialize tracing from environment variables
///
/// - `ALCHEMY_LOG_LEVEL`: trace, debug, info, warn, error
/// - `ALCHEMY_LOG_FORMAT`: text, json, json-compact
pub fn init_from_env() -> Result<(), AlchemyError> {
    init_subscriber(config_from_env()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_parses_levels_and_formats() {
        let config = SubscriberConfig::builder()
            .log_level_str("DEBUG")
            .unwrap()
            .output_format("json-compact".parse().unwrap())
            .build();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(filter_directive(config.log_level), "alchemy=debug");

        assert!(SubscriberConfig::builder().log_level_str("loud").is_err());
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn repeated_initialization_is_not_an_error() {
        assert!(init_subscriber(SubscriberConfig::debug()).is_ok());
        assert!(init_subscriber(SubscriberConfig::default()).is_ok());
        assert!(tracing::dispatcher::has_been_set());
    }
}
