//! Transforms that fetch remote resources and inline them.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::{MaterialTransform, TransformContext};
use crate::error::AlchemyError;
use crate::types::{DocumentSource, MaterialPart, MediaSource};

/// Media type assumed when the image response has no `content-type`.
pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/png";

/// GET `url`, failing with a `TransformError` on transport errors and non-2xx answers.
async fn fetch(
    client: &reqwest::Client,
    transform: &str,
    what: &str,
    url: &str,
) -> Result<reqwest::Response, AlchemyError> {
    tracing::debug!(target: "alchemy::transforms", transform, url, "fetching {what}");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AlchemyError::transform(transform, format!("Failed to fetch {what}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AlchemyError::transform(
            transform,
            format!(
                "Failed to fetch {what}: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            ),
        ));
    }
    Ok(response)
}

/// Inlines remote images as base64. See [`image_url_to_base64`].
#[derive(Debug, Clone, Default)]
pub struct ImageUrlToBase64 {
    client: reqwest::Client,
}

impl ImageUrlToBase64 {
    /// Use a preconfigured HTTP client (proxy, timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

/// Fetch every URL-sourced image and replace it with a base64 source.
///
/// The media type is taken from the response's `content-type` header,
/// falling back to `image/png`.
pub fn image_url_to_base64() -> ImageUrlToBase64 {
    ImageUrlToBase64::default()
}

#[async_trait]
impl MaterialTransform for ImageUrlToBase64 {
    fn name(&self) -> &str {
        "image_url_to_base64"
    }

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        _ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError> {
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            let MaterialPart::Image {
                source: MediaSource::Url { url },
            } = &part
            else {
                out.push(part);
                continue;
            };

            let response = fetch(&self.client, self.name(), "image", url).await?;
            let media_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(DEFAULT_IMAGE_MEDIA_TYPE)
                .to_string();
            let bytes = response.bytes().await.map_err(|e| {
                AlchemyError::transform(self.name(), format!("Failed to read image body: {e}"))
            })?;

            out.push(MaterialPart::Image {
                source: MediaSource::from_bytes(media_type, &bytes),
            });
        }
        Ok(out)
    }
}

/// Turns document parts into text parts. See [`document_to_text`].
#[derive(Debug, Clone, Default)]
pub struct DocumentToText {
    client: reqwest::Client,
}

impl DocumentToText {
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

/// Convert documents into text parts.
///
/// Inline documents become their text, prefixed with `[key: value, ...]`
/// when metadata is present. URL documents are fetched and their raw body
/// becomes the text.
pub fn document_to_text() -> DocumentToText {
    DocumentToText::default()
}

fn render_inline_document(
    text: &str,
    metadata: Option<&std::collections::BTreeMap<String, String>>,
) -> String {
    match metadata {
        Some(meta) if !meta.is_empty() => {
            let header = meta
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{header}]\n{text}")
        }
        _ => text.to_string(),
    }
}

#[async_trait]
impl MaterialTransform for DocumentToText {
    fn name(&self) -> &str {
        "document_to_text"
    }

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        _ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError> {
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                MaterialPart::Document {
                    source: DocumentSource::Text { text, metadata },
                } => out.push(MaterialPart::text(render_inline_document(
                    &text,
                    metadata.as_ref(),
                ))),
                MaterialPart::Document {
                    source: DocumentSource::Url { url },
                } => {
                    let response = fetch(&self.client, self.name(), "document", &url).await?;
                    let body = response.text().await.map_err(|e| {
                        AlchemyError::transform(
                            self.name(),
                            format!("Failed to read document body: {e}"),
                        )
                    })?;
                    out.push(MaterialPart::text(body));
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }
}
