//! Vendor HTTP helpers shared by every transmuter.

use serde_json::Value;

use crate::error::AlchemyError;

/// Send a vendor request and turn a non-success answer into `ApiError`.
pub async fn send_checked(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, AlchemyError> {
    let response = request
        .send()
        .await
        .map_err(|e| AlchemyError::HttpError(format!("Failed to send request: {e}")))?;

    if response.status().is_success() {
        return Ok(response);
    }
    Err(handle_response_error(provider, response).await)
}

/// Build an `ApiError` from a failed vendor response.
pub async fn handle_response_error(provider: &str, response: reqwest::Response) -> AlchemyError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::debug!(target: "alchemy::transmuters", provider, status = status.as_u16(), "vendor call failed");
    AlchemyError::api_error(provider, status.as_u16(), error_message(&body))
}

/// Pull the human-readable message out of a vendor error body.
///
/// OpenAI, Anthropic and Gemini all nest it under `error.message`; anything
/// else is returned verbatim.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
