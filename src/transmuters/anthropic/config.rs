//! Anthropic Configuration

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::AlchemyError;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const API_VERSION: &str = "2023-06-01";

/// Configuration for [`super::AnthropicTransmuter`].
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key, sent as `x-api-key`
    pub api_key: SecretString,
    pub base_url: String,
    pub default_model: String,
    /// The Messages API requires an explicit output budget
    pub max_tokens: u32,
    /// `anthropic-version` header value
    pub api_version: String,
    pub timeout: Option<Duration>,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_version: API_VERSION.to_string(),
            timeout: None,
        }
    }

    /// Read `ANTHROPIC_API_KEY` and, when set, `ANTHROPIC_BASE_URL`.
    pub fn from_env() -> Result<Self, AlchemyError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            AlchemyError::ConfigurationError("ANTHROPIC_API_KEY is not set".to_string())
        })?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), AlchemyError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(AlchemyError::ConfigurationError(
                "Anthropic API key cannot be empty".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(AlchemyError::ConfigurationError(
                "Anthropic max_tokens must be greater than zero".to_string(),
            ));
        }
        crate::transmuters::shared::validate_base_url("Anthropic", &self.base_url)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}
