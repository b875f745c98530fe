//! OpenAI Chat Completions transmuter
//!
//! Text-only prompts are sent as a plain string message; mixed prompts as
//! content parts. Images use `image_url`, which accepts remote URLs and
//! `data:` URLs alike.

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

pub use config::OpenAiConfig;
pub use streaming::OpenAiEventConverter;

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(Cow<'a, str>),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: Cow<'a, str> },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: Cow<'a, str>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: Option<u32>,
}

impl From<OpenAiUsage> for Usage {
    fn from(usage: OpenAiUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage
                .total_tokens
                .unwrap_or_else(|| usage.prompt_tokens.saturating_add(usage.completion_tokens)),
        }
    }
}

fn content_part(block: Block<'_>) -> ContentPart<'_> {
    match block {
        Block::Text(text) => ContentPart::Text { text },
        Block::Image(source) => {
            let url = match source {
                MediaSource::Url { url } => Cow::Borrowed(url.as_str()),
                MediaSource::Base64 { media_type, data } => {
                    Cow::Owned(format!("data:{media_type};base64,{data}"))
                }
            };
            ContentPart::ImageUrl {
                image_url: ImageUrl { url },
            }
        }
    }
}

/// Transmuter for the OpenAI Chat Completions API (and compatible servers).
#[derive(Debug, Clone)]
pub struct OpenAiTransmuter {
    config: OpenAiConfig,
    http_client: reqwest::Client,
}

impl OpenAiTransmuter {
    pub fn new(config: OpenAiConfig) -> Result<Self, AlchemyError> {
        let http_client = shared::build_http_client(config.timeout)?;
        Self::with_http_client(config, http_client)
    }

    pub fn with_http_client(
        config: OpenAiConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, AlchemyError> {
        config.validate()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, AlchemyError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    pub(crate) fn build_request<'a>(
        &'a self,
        parts: &'a [MaterialPart],
        options: &'a TransmuteOptions,
        stream: bool,
    ) -> Result<ChatCompletionRequest<'a>, AlchemyError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = shared::system_prompt(options) {
            messages.push(ChatMessage {
                role: "system",
                content: MessageContent::Text(Cow::Owned(system)),
            });
        }

        let content = match shared::map_content(PROVIDER, parts)? {
            PromptContent::Plain(text) => MessageContent::Text(Cow::Owned(text)),
            PromptContent::Blocks(blocks) => {
                MessageContent::Parts(blocks.into_iter().map(content_part).collect())
            }
        };
        messages.push(ChatMessage {
            role: "user",
            content,
        });

        Ok(ChatCompletionRequest {
            model: shared::resolve_model(options, &self.config.default_model),
            messages,
            temperature: shared::temperature(options),
            stream,
        })
    }

    fn post(&self, body: &ChatCompletionRequest<'_>) -> reqwest::RequestBuilder {
        self.http_client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body)
    }

    async fn send(
        &self,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<TransmutationResult, AlchemyError> {
        let response = send_checked(PROVIDER, self.post(body)).await?;
        let response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| shared::parse_error(PROVIDER, e))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| shared::parse_error(PROVIDER, "response contained no choices"))?
            .message
            .content
            .unwrap_or_default();

        let mut result = TransmutationResult::new(text);
        result.usage = response.usage.map(Usage::from);
        Ok(result)
    }
}

#[async_trait]
impl Transmuter for OpenAiTransmuter {
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
            target: "alchemy::transmuters::openai",
            model = body.model,
            parts = parts.len(),
            "chat completion"
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
            target: "alchemy::transmuters::openai",
            model = body.model,
            parts = parts.len(),
            "streaming chat completion"
        );
        let stream = with_cancellation(
            options.cancel.as_ref(),
            StreamFactory::create_eventsource_stream(PROVIDER, self.post(&body), OpenAiEventConverter),
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

    fn transmuter() -> OpenAiTransmuter {
        OpenAiTransmuter::new(OpenAiConfig::new("sk-test")).unwrap()
    }

    #[test]
    fn text_prompts_are_plain_strings() {
        let t = transmuter();
        let parts = vec![MaterialPart::text("Hello"), MaterialPart::text("World")];
        let options = TransmuteOptions::new()
            .with_catalyst(CatalystConfig::new().with_role("Be brief.").with_temperature(0.2))
            .with_language("Spanish");
        let body = serde_json::to_value(t.build_request(&parts, &options, false).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "Be brief.\nRespond in Spanish."},
                    {"role": "user", "content": "Hello\n\nWorld"}
                ],
                "temperature": 0.2f32
            })
        );
    }

    #[test]
    fn images_become_image_url_parts() {
        let t = transmuter();
        let parts = vec![
            MaterialPart::text("What is this?"),
            MaterialPart::image_url("https://example.com/cat.png"),
            MaterialPart::image_base64("image/jpeg", "AAAA"),
        ];
        let options = TransmuteOptions::new().with_catalyst(CatalystConfig::new().with_model("gpt-4o"));
        let body = serde_json::to_value(t.build_request(&parts, &options, true).unwrap()).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["messages"][0]["content"],
            json!([
                {"type": "text", "text": "What is this?"},
                {"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}},
                {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}}
            ])
        );
    }

    #[test]
    fn invalid_configs_fail_at_construction() {
        assert!(OpenAiTransmuter::new(OpenAiConfig::new("")).is_err());
    }
}
