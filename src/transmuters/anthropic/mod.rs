//! Anthropic Messages transmuter
//!
//! The system prompt travels in the top-level `system` field. Images are sent
//! as `image` blocks with either a `url` or a `base64` source.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::Transmuter;
use super::shared::{self, Block, PromptContent};
use crate::error::AlchemyError;
use crate::types::{
    MaterialPart, MediaSource, TextStream, TransmutationResult, TransmuteOptions, Usage,
};
use crate::utils::http::send_checked;
use crate::utils::{StreamFactory, cancellable_stream, with_cancellation};

mod config;
mod streaming;

pub use config::AnthropicConfig;
pub use streaming::AnthropicEventConverter;

const PROVIDER: &str = "anthropic";

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(String),
    Blocks(Vec<ContentBlock<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Text { text: Cow<'a, str> },
    Image { source: ImageSource<'a> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ImageSource<'a> {
    Url { url: &'a str },
    Base64 { media_type: &'a str, data: &'a str },
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl From<AnthropicUsage> for Usage {
    fn from(usage: AnthropicUsage) -> Self {
        Usage::new(usage.input_tokens, usage.output_tokens)
    }
}

fn content_block(block: Block<'_>) -> ContentBlock<'_> {
    match block {
        Block::Text(text) => ContentBlock::Text { text },
        Block::Image(MediaSource::Url { url }) => ContentBlock::Image {
            source: ImageSource::Url { url },
        },
        Block::Image(MediaSource::Base64 { media_type, data }) => ContentBlock::Image {
            source: ImageSource::Base64 { media_type, data },
        },
    }
}

/// Transmuter for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicTransmuter {
    config: AnthropicConfig,
    http_client: reqwest::Client,
}

impl AnthropicTransmuter {
    pub fn new(config: AnthropicConfig) -> Result<Self, AlchemyError> {
        let http_client = shared::build_http_client(config.timeout)?;
        Self::with_http_client(config, http_client)
    }

    pub fn with_http_client(
        config: AnthropicConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, AlchemyError> {
        config.validate()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build from `ANTHROPIC_API_KEY` / `ANTHROPIC_BASE_URL`.
    pub fn from_env() -> Result<Self, AlchemyError> {
        Self::new(AnthropicConfig::from_env()?)
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    pub(crate) fn build_request<'a>(
        &'a self,
        parts: &'a [MaterialPart],
        options: &'a TransmuteOptions,
        stream: bool,
    ) -> Result<MessagesRequest<'a>, AlchemyError> {
        let content = match shared::map_content(PROVIDER, parts)? {
            PromptContent::Plain(text) => MessageContent::Text(text),
            PromptContent::Blocks(blocks) => {
                MessageContent::Blocks(blocks.into_iter().map(content_block).collect())
            }
        };

        Ok(MessagesRequest {
            model: shared::resolve_model(options, &self.config.default_model),
            max_tokens: self.config.max_tokens,
            system: shared::system_prompt(options),
            messages: vec![Message {
                role: "user",
                content,
            }],
            temperature: shared::temperature(options),
            stream,
        })
    }

    fn post(&self, body: &MessagesRequest<'_>) -> reqwest::RequestBuilder {
        self.http_client
            .post(self.config.endpoint("messages"))
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", &self.config.api_version)
            .json(body)
    }

    async fn send(&self, body: &MessagesRequest<'_>) -> Result<TransmutationResult, AlchemyError> {
        let response = send_checked(PROVIDER, self.post(body)).await?;
        let response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| shared::parse_error(PROVIDER, e))?;

        let text: String = response
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect();

        let mut result = TransmutationResult::new(text);
        result.usage = response.usage.map(Usage::from);
        Ok(result)
    }
}

#[async_trait]
impl Transmuter for AnthropicTransmuter {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn transmute(
        &self,
        parts: &[MaterialPart],
        options: &TransmuteOptions,
    ) -> Result<TransmutationResult, AlchemyError> {
        let body = self.build_request(parts, options, false)?;
        tracing::debug!(
            target: "alchemy::transmuters::anthropic",
            model = body.model,
            parts = parts.len(),
            "messages request"
        );
        with_cancellation(options.cancel.as_ref(), self.send(&body)).await
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn stream(
        &self,
        parts: &[MaterialPart],
        options: &TransmuteOptions,
    ) -> Result<TextStream, AlchemyError> {
        let body = self.build_request(parts, options, true)?;
        tracing::debug!(
            target: "alchemy::transmuters::anthropic",
            model = body.model,
            parts = parts.len(),
            "streaming messages request"
        );
        let stream = with_cancellation(
            options.cancel.as_ref(),
            StreamFactory::create_eventsource_stream(
                PROVIDER,
                self.post(&body),
                AnthropicEventConverter,
            ),
        )
        .await?;
        Ok(cancellable_stream(stream, options.cancel.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalystConfig;
    use serde_json::json;

    fn transmuter() -> AnthropicTransmuter {
        AnthropicTransmuter::new(AnthropicConfig::new("test-key")).unwrap()
    }

    #[test]
    fn system_prompt_uses_the_top_level_field() {
        let t = transmuter();
        let parts = vec![MaterialPart::text("Hi")];
        let options = TransmuteOptions::new()
            .with_catalyst(CatalystConfig::new().with_role("You are terse."));
        let body = serde_json::to_value(t.build_request(&parts, &options, false).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "claude-3-5-haiku-latest",
                "max_tokens": 4096,
                "system": "You are terse.",
                "messages": [{"role": "user", "content": "Hi"}]
            })
        );
    }

    #[test]
    fn no_role_and_no_language_omits_system() {
        let t = transmuter();
        let parts = vec![MaterialPart::text("Hi")];
        let body =
            serde_json::to_value(t.build_request(&parts, &TransmuteOptions::new(), false).unwrap())
                .unwrap();
        assert!(body.get("system").is_none());
    }

    #[test]
    fn images_map_to_url_and_base64_sources() {
        let t = transmuter();
        let parts = vec![
            MaterialPart::image_url("https://example.com/a.png"),
            MaterialPart::image_base64("image/png", "iVBO"),
            MaterialPart::text("Compare them."),
        ];
        let body =
            serde_json::to_value(t.build_request(&parts, &TransmuteOptions::new(), true).unwrap())
                .unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(
            body["messages"][0]["content"],
            json!([
                {"type": "image", "source": {"type": "url", "url": "https://example.com/a.png"}},
                {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "iVBO"}},
                {"type": "text", "text": "Compare them."}
            ])
        );
    }
}
