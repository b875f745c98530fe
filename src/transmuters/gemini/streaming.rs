//! Gemini streaming implementation using eventsource-stream
//!
//! With `alt=sse` every event carries a complete `GenerateContentResponse`
//! holding only the newly generated text.

use eventsource_stream::Event;

use super::GenerateContentResponse;
use crate::error::AlchemyError;
use crate::utils::SseEventConverter;
use crate::utils::streaming::parse_event_json;

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiEventConverter;

impl SseEventConverter for GeminiEventConverter {
    fn convert_event(&self, event: &Event) -> Option<Result<String, AlchemyError>> {
        let value = parse_event_json("gemini", event)?;

        if let Some(message) = value.pointer("/error/message").and_then(|m| m.as_str()) {
            return Some(Err(AlchemyError::StreamError(message.to_string())));
        }

        let chunk: GenerateContentResponse = match serde_json::from_value(value) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(target: "alchemy::transmuters::gemini", error = %e, "unexpected chunk shape");
                return None;
            }
        };
        let text = chunk.text();
        (!text.is_empty()).then_some(Ok(text))
    }
}
