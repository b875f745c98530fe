//! Build transforms from configuration strings.
//!
//! | String | Transform |
//! |---|---|
//! | `truncate:<n>[:<suffix>]` | [`truncate_text`] |
//! | `prepend:<text>` | [`prepend_text`] |
//! | `filter:<type>[,<type>...]` | [`filter_by_type`] |
//! | `image-url-to-base64` | [`image_url_to_base64`] |
//! | `document-to-text` | [`document_to_text`] |
//! | `audio-to-text[:stub]` | [`audio_to_text`] |
//! | `video-to-frames[:stub]` | [`video_to_frames`] |

use super::{
    MaterialTransform, MediaConversionOptions, SharedTransform, audio_to_text, document_to_text,
    filter_by_type, image_url_to_base64, prepend_text, truncate_text, video_to_frames,
};
use crate::error::AlchemyError;

const CORE_PART_TYPES: [&str; 6] = ["text", "image", "audio", "video", "document", "data"];

fn invalid(spec: &str, message: impl Into<String>) -> AlchemyError {
    AlchemyError::InvalidTransform {
        spec: spec.to_string(),
        message: message.into(),
    }
}

fn media_options(spec: &str, arg: Option<&str>) -> Result<MediaConversionOptions, AlchemyError> {
    match arg {
        None => Ok(MediaConversionOptions::default()),
        Some("stub") => Ok(MediaConversionOptions::stub()),
        Some(other) => Err(invalid(spec, format!("unknown option '{other}', expected 'stub'"))),
    }
}

fn no_argument(spec: &str, name: &str, arg: Option<&str>) -> Result<(), AlchemyError> {
    match arg {
        None => Ok(()),
        Some(_) => Err(invalid(spec, format!("'{name}' takes no argument"))),
    }
}

/// Parse one transform configuration string.
pub fn parse_transform(spec: &str) -> Result<SharedTransform, AlchemyError> {
    let trimmed = spec.trim();
    let (name, arg) = match trimmed.split_once(':') {
        Some((name, arg)) => (name.trim(), Some(arg)),
        None => (trimmed, None),
    };

    match name {
        "truncate" => {
            let arg = arg.ok_or_else(|| invalid(spec, "missing maximum length"))?;
            let (length, suffix) = match arg.split_once(':') {
                Some((length, suffix)) => (length, Some(suffix)),
                None => (arg, None),
            };
            let max_length: usize = length
                .trim()
                .parse()
                .map_err(|_| invalid(spec, format!("'{length}' is not a valid length")))?;
            let transform = truncate_text(max_length);
            Ok(match suffix {
                Some(suffix) => transform.with_suffix(suffix).boxed(),
                None => transform.boxed(),
            })
        }
        "prepend" => match arg {
            Some(text) if !text.is_empty() => Ok(prepend_text(text).boxed()),
            _ => Err(invalid(spec, "missing text to prepend")),
        },
        "filter" => {
            let arg = arg.ok_or_else(|| invalid(spec, "missing part types"))?;
            let types: Vec<&str> = arg.split(',').map(str::trim).collect();
            if let Some(unknown) = types.iter().find(|t| !CORE_PART_TYPES.contains(t)) {
                return Err(invalid(spec, format!("unknown part type '{unknown}'")));
            }
            Ok(filter_by_type(types).boxed())
        }
        "image-url-to-base64" => {
            no_argument(spec, name, arg)?;
            Ok(image_url_to_base64().boxed())
        }
        "document-to-text" => {
            no_argument(spec, name, arg)?;
            Ok(document_to_text().boxed())
        }
        "audio-to-text" => Ok(audio_to_text(media_options(spec, arg)?).boxed()),
        "video-to-frames" => Ok(video_to_frames(media_options(spec, arg)?).boxed()),
        other => Err(invalid(spec, format!("unknown transform '{other}'"))),
    }
}

/// Parse a list of configuration strings, preserving order.
pub fn parse_transforms<I, S>(specs: I) -> Result<Vec<SharedTransform>, AlchemyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    specs
        .into_iter()
        .map(|spec| parse_transform(spec.as_ref()))
        .collect()
}
