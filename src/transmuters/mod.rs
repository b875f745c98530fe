//! Transmuters - vendor adapters
//!
//! A [`Transmuter`] executes one model call for a list of material parts.
//! Every adapter follows the same system prompt and content mapping rules
//! (see [`shared`]) and reports failures through [`AlchemyError`].
//!
//! | Transmuter | Endpoint | Streaming |
//! |---|---|---|
//! | [`OpenAiTransmuter`] | `POST {base}/chat/completions` | SSE, `choices[0].delta.content` |
//! | [`AnthropicTransmuter`] | `POST {base}/messages` | SSE, `content_block_delta` |
//! | [`GeminiTransmuter`] | `POST {base}/models/{model}:generateContent` | SSE, `streamGenerateContent?alt=sse` |

use async_trait::async_trait;

use crate::error::AlchemyError;
use crate::types::{MaterialPart, TextStream, TransmutationResult, TransmuteOptions};

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod shared;

pub use anthropic::{AnthropicConfig, AnthropicTransmuter};
pub use gemini::{GeminiConfig, GeminiTransmuter};
pub use openai::{OpenAiConfig, OpenAiTransmuter};
pub use shared::build_system_prompt;

/// One vendor, one model call.
///
/// Implementations hold no per-call state; a single instance serves any
/// number of concurrent calls.
#[async_trait]
pub trait Transmuter: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Send the parts and return the complete response text.
    async fn transmute(
        &self,
        parts: &[MaterialPart],
        options: &TransmuteOptions,
    ) -> Result<TransmutationResult, AlchemyError>;

    /// Whether [`Transmuter::stream`] is implemented.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Send the parts and yield text chunks as the vendor produces them.
    async fn stream(
        &self,
        _parts: &[MaterialPart],
        _options: &TransmuteOptions,
    ) -> Result<TextStream, AlchemyError> {
        Err(AlchemyError::streaming_unsupported(self.name()))
    }
}
