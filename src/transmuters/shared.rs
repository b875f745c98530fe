//! Rules every transmuter applies before talking to its vendor.

use std::borrow::Cow;
use std::time::Duration;

use crate::error::AlchemyError;
use crate::types::{
    CatalystConfig, DocumentSource, MaterialPart, MediaSource, TransmuteOptions, extract_text,
    is_text_only,
};

/// Placeholder sent for audio parts that were not transcribed.
pub const AUDIO_PLACEHOLDER: &str =
    "[Audio content omitted: apply the audio_to_text() transform to include it]";

/// Placeholder sent for video parts that were not converted.
pub const VIDEO_PLACEHOLDER: &str =
    "[Video content omitted: apply the video_to_frames() transform to include it]";

/// System prompt from the catalyst role and the target language.
///
/// Both present: `"<role>\nRespond in <language>."`. One present: only that
/// line. Neither: `None`, so the vendor's system channel is left out.
pub fn build_system_prompt(
    catalyst: Option<&CatalystConfig>,
    language: Option<&str>,
) -> Option<String> {
    let role = catalyst
        .and_then(|c| c.role_definition.as_deref())
        .filter(|r| !r.is_empty());
    let language = language.filter(|l| !l.is_empty()).map(|l| format!("Respond in {l}."));

    match (role, language) {
        (Some(role), Some(language)) => Some(format!("{role}\n{language}")),
        (Some(role), None) => Some(role.to_string()),
        (None, Some(language)) => Some(language),
        (None, None) => None,
    }
}

/// System prompt for a call's options.
pub(crate) fn system_prompt(options: &TransmuteOptions) -> Option<String> {
    build_system_prompt(options.catalyst.as_ref(), options.language.as_deref())
}

/// `catalyst.model` when set, the transmuter default otherwise.
pub(crate) fn resolve_model<'a>(options: &'a TransmuteOptions, default_model: &'a str) -> &'a str {
    options
        .catalyst
        .as_ref()
        .and_then(|c| c.model.as_deref())
        .unwrap_or(default_model)
}

pub(crate) fn temperature(options: &TransmuteOptions) -> Option<f32> {
    options.catalyst.as_ref().and_then(|c| c.temperature)
}

/// Vendor-neutral content block.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block<'a> {
    Text(Cow<'a, str>),
    Image(&'a MediaSource),
}

/// Prompt content before vendor-specific encoding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PromptContent<'a> {
    /// Every part was text; joined with a blank line
    Plain(String),
    /// One block per part, in order
    Blocks(Vec<Block<'a>>),
}

/// Map parts to either a plain string or one block per part.
///
/// Extension parts fail with `UnsupportedPartType`; nothing is dropped.
pub(crate) fn map_content<'a>(
    provider: &str,
    parts: &'a [MaterialPart],
) -> Result<PromptContent<'a>, AlchemyError> {
    if is_text_only(parts) {
        return Ok(PromptContent::Plain(extract_text(parts)));
    }

    let blocks = parts
        .iter()
        .map(|part| match part {
            MaterialPart::Text { text } => Ok(Block::Text(Cow::Borrowed(text.as_str()))),
            MaterialPart::Image { source } => Ok(Block::Image(source)),
            MaterialPart::Document {
                source: DocumentSource::Text { text, .. },
            } => Ok(Block::Text(Cow::Borrowed(text.as_str()))),
            MaterialPart::Document {
                source: DocumentSource::Url { url },
            } => Ok(Block::Text(Cow::Owned(format!("[Document: {url}]")))),
            MaterialPart::Data {
                format,
                content,
                label,
            } => {
                let prefix = match label {
                    Some(label) => format!("[{label}] ({format})"),
                    None => format!("({format})"),
                };
                Ok(Block::Text(Cow::Owned(format!("{prefix}\n{content}"))))
            }
            MaterialPart::Audio { .. } => Ok(Block::Text(Cow::Borrowed(AUDIO_PLACEHOLDER))),
            MaterialPart::Video { .. } => Ok(Block::Text(Cow::Borrowed(VIDEO_PLACEHOLDER))),
            MaterialPart::Extension(ext) => {
                Err(AlchemyError::unsupported_part(provider, ext.part_type()))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PromptContent::Blocks(blocks))
}

/// Text block used by vendors that cannot reference remote images.
pub(crate) fn remote_image_placeholder(url: &str) -> String {
    format!(
        "[Image: {url}] (remote image URLs are not supported by this provider; \
         apply the image_url_to_base64() transform to inline the image)"
    )
}

/// Reject empty or non-HTTP base URLs.
pub(crate) fn validate_base_url(provider: &str, base_url: &str) -> Result<(), AlchemyError> {
    if base_url.is_empty() {
        return Err(AlchemyError::ConfigurationError(format!(
            "{provider} base URL cannot be empty"
        )));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(AlchemyError::ConfigurationError(format!(
            "{provider} base URL must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Default HTTP client, honouring an optional request timeout.
pub(crate) fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, AlchemyError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| AlchemyError::ConfigurationError(format!("Failed to build HTTP client: {e}")))
}

/// Wrap a vendor response body that could not be decoded.
pub(crate) fn parse_error(provider: &str, e: impl std::fmt::Display) -> AlchemyError {
    AlchemyError::ParseError(format!("Invalid {provider} response: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CustomMaterial, DataFormat};
    use std::any::Any;

    #[test]
    fn system_prompt_combines_role_and_language() {
        let catalyst = CatalystConfig::new().with_role("You are a poet.");
        assert_eq!(
            build_system_prompt(Some(&catalyst), Some("French")).as_deref(),
            Some("You are a poet.\nRespond in French.")
        );
        assert_eq!(
            build_system_prompt(Some(&catalyst), None).as_deref(),
            Some("You are a poet.")
        );
        assert_eq!(
            build_system_prompt(None, Some("German")).as_deref(),
            Some("Respond in German.")
        );
        assert_eq!(build_system_prompt(Some(&CatalystConfig::new()), None), None);
        assert_eq!(build_system_prompt(None, None), None);
    }

    #[test]
    fn model_falls_back_to_default() {
        let options = TransmuteOptions::new();
        assert_eq!(resolve_model(&options, "default"), "default");
        let options = options.with_catalyst(CatalystConfig::new().with_model("gpt-4o"));
        assert_eq!(resolve_model(&options, "default"), "gpt-4o");
    }

    #[test]
    fn text_only_parts_collapse_to_a_string() {
        let parts = vec![MaterialPart::text("a"), MaterialPart::text("b")];
        assert_eq!(
            map_content("openai", &parts).unwrap(),
            PromptContent::Plain("a\n\nb".into())
        );
    }

    #[test]
    fn mixed_parts_map_one_block_each() {
        let parts = vec![
            MaterialPart::text("Look:"),
            MaterialPart::image_url("https://example.com/cat.png"),
            MaterialPart::document_url("https://example.com/doc.txt"),
            MaterialPart::document_text("inline doc"),
            MaterialPart::labeled_data(DataFormat::Csv, "a,b\n1,2", "sales"),
            MaterialPart::data(DataFormat::Json, "{}"),
            MaterialPart::audio_url("https://example.com/a.mp3"),
            MaterialPart::video_url("https://example.com/v.mp4"),
        ];
        let PromptContent::Blocks(blocks) = map_content("openai", &parts).unwrap() else {
            panic!("expected blocks");
        };
        let texts: Vec<Option<&str>> = blocks
            .iter()
            .map(|b| match b {
                Block::Text(t) => Some(t.as_ref()),
                Block::Image(_) => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                Some("Look:"),
                None,
                Some("[Document: https://example.com/doc.txt]"),
                Some("inline doc"),
                Some("[sales] (csv)\na,b\n1,2"),
                Some("(json)\n{}"),
                Some(AUDIO_PLACEHOLDER),
                Some(VIDEO_PLACEHOLDER),
            ]
        );
    }

    #[derive(Debug)]
    struct Hologram;

    impl CustomMaterial for Hologram {
        fn part_type(&self) -> &str {
            "hologram"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn extension_parts_are_rejected() {
        let parts = vec![MaterialPart::text("x"), MaterialPart::extension(Hologram)];
        let err = map_content("gemini", &parts).unwrap_err();
        assert!(matches!(
            err,
            AlchemyError::UnsupportedPartType { ref provider, ref part_type }
                if provider == "gemini" && part_type == "hologram"
        ));
    }
}
