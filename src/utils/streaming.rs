//! Common Streaming Utilities
//!
//! Vendor streams arrive as server-sent events. `eventsource-stream` handles
//! UTF-8 boundaries, line buffering and SSE framing; each vendor only supplies
//! an [`SseEventConverter`] that maps one event to an optional text delta.

use eventsource_stream::{Event, Eventsource};
use futures_util::StreamExt;

use super::http::send_checked;
use crate::error::AlchemyError;
use crate::types::TextStream;

/// Converts one vendor SSE event into a text delta.
pub trait SseEventConverter: Send + Sync {
    /// `None` skips the event (keep-alives, metadata, empty deltas).
    fn convert_event(&self, event: &Event) -> Option<Result<String, AlchemyError>>;
}

/// Stream factory for vendor SSE endpoints
pub struct StreamFactory;

impl StreamFactory {
    /// Send the request, check the status, then stream text deltas.
    ///
    /// Non-success answers fail before any chunk is produced. The OpenAI
    /// `[DONE]` sentinel and empty events are skipped.
    pub async fn create_eventsource_stream<C>(
        provider: &str,
        request_builder: reqwest::RequestBuilder,
        converter: C,
    ) -> Result<TextStream, AlchemyError>
    where
        C: SseEventConverter + 'static,
    {
        let response = send_checked(provider, request_builder).await?;
        tracing::debug!(target: "alchemy::streaming", provider, "stream opened");

        let text_stream = response
            .bytes_stream()
            .eventsource()
            .filter_map(move |event_result| {
                let item = match event_result {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data.is_empty() || data == "[DONE]" {
                            None
                        } else {
                            converter.convert_event(&event)
                        }
                    }
                    Err(e) => Some(Err(AlchemyError::StreamError(format!(
                        "SSE parsing error: {e}"
                    )))),
                };
                futures::future::ready(item)
            });

        Ok(Box::pin(text_stream))
    }
}

/// Parse an event's JSON payload, logging and skipping anything unreadable.
pub fn parse_event_json(provider: &str, event: &Event) -> Option<serde_json::Value> {
    match serde_json::from_str(&event.data) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                target: "alchemy::streaming",
                provider,
                error = %e,
                "skipping unparseable stream event"
            );
            None
        }
    }
}
