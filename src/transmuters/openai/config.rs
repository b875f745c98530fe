//! OpenAI Configuration

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::AlchemyError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for [`super::OpenAiTransmuter`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication
    pub api_key: SecretString,
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Model used when the catalyst names none
    pub default_model: String,
    /// Request timeout
    pub timeout: Option<Duration>,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    /// Read `OPENAI_API_KEY` and, when set, `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, AlchemyError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            AlchemyError::ConfigurationError("OPENAI_API_KEY is not set".to_string())
        })?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
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

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AlchemyError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(AlchemyError::ConfigurationError(
                "OpenAI API key cannot be empty".to_string(),
            ));
        }
        crate::transmuters::shared::validate_base_url("OpenAI", &self.base_url)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}
