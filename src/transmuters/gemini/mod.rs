//! Gemini generateContent transmuter
//!
//! Gemini only accepts inline image bytes here, so remote image URLs degrade
//! to a text block naming the URL. Run `image_url_to_base64()` first to send
//! the image itself.

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

pub use config::GeminiConfig;
pub use streaming::GeminiEventConverter;

const PROVIDER: &str = "gemini";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(Cow<'a, str>),
    InlineData(InlineData<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Response body shared by `generateContent` and each streamed chunk.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    total_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }

    fn usage(&self) -> Option<Usage> {
        self.usage_metadata.as_ref().map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u
                .total_token_count
                .unwrap_or_else(|| u.prompt_token_count.saturating_add(u.candidates_token_count)),
        })
    }
}

fn part(block: Block<'_>) -> Part<'_> {
    match block {
        Block::Text(text) => Part::Text(text),
        Block::Image(MediaSource::Base64 { media_type, data }) => Part::InlineData(InlineData {
            mime_type: media_type,
            data,
        }),
        Block::Image(MediaSource::Url { url }) => {
            Part::Text(Cow::Owned(shared::remote_image_placeholder(url)))
        }
    }
}

/// Transmuter for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiTransmuter {
    config: GeminiConfig,
    http_client: reqwest::Client,
}

impl GeminiTransmuter {
    pub fn new(config: GeminiConfig) -> Result<Self, AlchemyError> {
        let http_client = shared::build_http_client(config.timeout)?;
        Self::with_http_client(config, http_client)
    }

    pub fn with_http_client(
        config: GeminiConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, AlchemyError> {
        config.validate()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Build from `GEMINI_API_KEY` / `GOOGLE_API_KEY` / `GEMINI_BASE_URL`.
    pub fn from_env() -> Result<Self, AlchemyError> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub(crate) fn build_request<'a>(
        &self,
        parts: &'a [MaterialPart],
        options: &TransmuteOptions,
    ) -> Result<GenerateContentRequest<'a>, AlchemyError> {
        let user_parts = match shared::map_content(PROVIDER, parts)? {
            PromptContent::Plain(text) => vec![Part::Text(Cow::Owned(text))],
            PromptContent::Blocks(blocks) => blocks.into_iter().map(part).collect(),
        };

        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: user_parts,
            }],
            system_instruction: shared::system_prompt(options).map(|system| Content {
                role: None,
                parts: vec![Part::Text(Cow::Owned(system))],
            }),
            generation_config: shared::temperature(options)
                .map(|temperature| GenerationConfig { temperature }),
        })
    }

    fn post(&self, url: String, body: &GenerateContentRequest<'_>) -> reqwest::RequestBuilder {
        self.http_client
            .post(url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(body)
    }

    async fn send(
        &self,
        model: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<TransmutationResult, AlchemyError> {
        let url = self.config.model_endpoint(model, "generateContent");
        let response = send_checked(PROVIDER, self.post(url, body)).await?;
        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| shared::parse_error(PROVIDER, e))?;

        let mut result = TransmutationResult::new(response.text());
        result.usage = response.usage();
        Ok(result)
    }
}

#[async_trait]
impl Transmuter for GeminiTransmuter {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn transmute(
        &self,
        parts: &[MaterialPart],
        options: &TransmuteOptions,
    ) -> Result<TransmutationResult, AlchemyError> {
        let body = self.build_request(parts, options)?;
        let model = shared::resolve_model(options, &self.config.default_model);
        tracing::debug!(
            target: "alchemy::transmuters::gemini",
            model,
            parts = parts.len(),
            "generateContent"
        );
        with_cancellation(options.cancel.as_ref(), self.send(model, &body)).await
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn stream(
        &self,
        parts: &[MaterialPart],
        options: &TransmuteOptions,
    ) -> Result<TextStream, AlchemyError> {
        let body = self.build_request(parts, options)?;
        let model = shared::resolve_model(options, &self.config.default_model);
        tracing::debug!(
            target: "alchemy::transmuters::gemini",
            model,
            parts = parts.len(),
            "streamGenerateContent"
        );
        let url = format!(
            "{}?alt=sse",
            self.config.model_endpoint(model, "streamGenerateContent")
        );
        let stream = with_cancellation(
            options.cancel.as_ref(),
            StreamFactory::create_eventsource_stream(
                PROVIDER,
                self.post(url, &body),
                GeminiEventConverter,
            ),
        )
        .await?;
        Ok(cancellable_stream(stream, options.cancel.clone()))
    }
}
