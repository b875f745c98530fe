//! Anthropic streaming implementation using eventsource-stream

use eventsource_stream::Event;
use serde::Deserialize;

use crate::error::AlchemyError;
use crate::utils::SseEventConverter;
use crate::utils::streaming::parse_event_json;

/// Anthropic stream event structure
///
/// Only `content_block_delta` and `error` carry anything the pipeline needs;
/// the other event types are skipped.
#[derive(Debug, Deserialize)]
struct AnthropicStreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    delta: Option<AnthropicDelta>,
    #[serde(default)]
    error: Option<AnthropicStreamError>,
}

#[derive(Debug, Deserialize)]
struct AnthropicDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicStreamError {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    message: String,
}

/// Maps `content_block_delta` text deltas to chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicEventConverter;

impl SseEventConverter for AnthropicEventConverter {
    fn convert_event(&self, event: &Event) -> Option<Result<String, AlchemyError>> {
        let value = parse_event_json("anthropic", event)?;
        let event: AnthropicStreamEvent = match serde_json::from_value(value) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(target: "alchemy::transmuters::anthropic", error = %e, "unexpected event shape");
                return None;
            }
        };

        match event.event_type.as_str() {
            "content_block_delta" => event
                .delta
                .and_then(|d| d.text)
                .filter(|text| !text.is_empty())
                .map(Ok),
            "error" => {
                let message = match event.error {
                    Some(AnthropicStreamError {
                        error_type: Some(kind),
                        message,
                    }) => format!("{kind}: {message}"),
                    Some(error) => error.message,
                    None => "unknown stream error".to_string(),
                };
                Some(Err(AlchemyError::StreamError(message)))
            }
            _ => None,
        }
    }
}
