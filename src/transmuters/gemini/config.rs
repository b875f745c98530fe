//! Gemini Configuration

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::AlchemyError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for [`super::GeminiTransmuter`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key, sent as `x-goog-api-key`
    pub api_key: SecretString,
    pub base_url: String,
    pub default_model: String,
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    /// Read `GEMINI_API_KEY` (falling back to `GOOGLE_API_KEY`) and, when
    /// set, `GEMINI_BASE_URL`.
    pub fn from_env() -> Result<Self, AlchemyError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| {
                AlchemyError::ConfigurationError(
                    "GEMINI_API_KEY (or GOOGLE_API_KEY) is not set".to_string(),
                )
            })?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
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

    pub fn validate(&self) -> Result<(), AlchemyError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(AlchemyError::ConfigurationError(
                "Gemini API key cannot be empty".to_string(),
            ));
        }
        crate::transmuters::shared::validate_base_url("Gemini", &self.base_url)
    }

    /// `{base}/models/{model}:{method}`; a `models/` prefix on the model id is tolerated.
    pub(crate) fn model_endpoint(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/models/{model}:{method}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_endpoints() {
        let config = GeminiConfig::new("key");
        assert_eq!(
            config.model_endpoint("gemini-2.0-flash", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            config
                .with_base_url("http://127.0.0.1:9000/")
                .model_endpoint("models/gemini-pro", "streamGenerateContent"),
            "http://127.0.0.1:9000/models/gemini-pro:streamGenerateContent"
        );
    }
}
