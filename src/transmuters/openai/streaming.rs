//! OpenAI streaming implementation using eventsource-stream

use eventsource_stream::Event;
use serde::Deserialize;

use crate::error::AlchemyError;
use crate::utils::SseEventConverter;
use crate::utils::streaming::parse_event_json;

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    message: String,
}

/// Maps `chat.completion.chunk` events to `choices[0].delta.content`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiEventConverter;

impl SseEventConverter for OpenAiEventConverter {
    fn convert_event(&self, event: &Event) -> Option<Result<String, AlchemyError>> {
        let value = parse_event_json("openai", event)?;
        let chunk: OpenAiStreamChunk = match serde_json::from_value(value) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(target: "alchemy::transmuters::openai", error = %e, "unexpected chunk shape");
                return None;
            }
        };

        if let Some(error) = chunk.error {
            return Some(Err(AlchemyError::StreamError(error.message)));
        }

        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta)
            .and_then(|d| d.content)
            .filter(|text| !text.is_empty())
            .map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(data: &str) -> Event {
        Event {
            data: data.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn content_deltas_are_extracted() {
        let converter = OpenAiEventConverter;
        let out = converter
            .convert_event(&event(r#"{"choices":[{"index":0,"delta":{"content":"Hel"}}]}"#))
            .unwrap()
            .unwrap();
        assert_eq!(out, "Hel");
    }

    #[test]
    fn role_only_and_finish_chunks_are_skipped() {
        let converter = OpenAiEventConverter;
        assert!(
            converter
                .convert_event(&event(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#))
                .is_none()
        );
        assert!(
            converter
                .convert_event(&event(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#))
                .is_none()
        );
    }

    #[test]
    fn error_chunks_fail_the_stream() {
        let err = OpenAiEventConverter
            .convert_event(&event(r#"{"error":{"message":"overloaded"}}"#))
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, AlchemyError::StreamError(m) if m == "overloaded"));
    }
}
