//! Materials wire format
//!
//! HTTP collaborators receive materials as flat JSON objects
//! (`{"type": "image", "imageUrl": "..."}`); this module turns them into
//! [`MaterialPart`]s.

use serde::{Deserialize, Serialize};

use super::material::{DataFormat, MaterialPart, MediaSource};
use crate::error::AlchemyError;

/// One material as it travels over HTTP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMaterial {
    #[serde(rename = "type")]
    pub material_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_label: Option<String>,
}

fn required<'a>(
    value: &'a Option<String>,
    field: &str,
    material_type: &str,
) -> Result<&'a str, AlchemyError> {
    value.as_deref().ok_or_else(|| {
        AlchemyError::InvalidInput(format!(
            "Material of type '{material_type}' requires field '{field}'"
        ))
    })
}

/// Parse `data:<mime>;base64,<payload>`.
fn parse_data_url(data_url: &str) -> Option<(String, String)> {
    let rest = data_url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let media_type = header.strip_suffix(";base64")?;
    Some((media_type.to_string(), data.to_string()))
}

fn media_source(url: &str) -> MediaSource {
    match parse_data_url(url) {
        Some((media_type, data)) => MediaSource::Base64 { media_type, data },
        None => MediaSource::url(url),
    }
}

impl TryFrom<WireMaterial> for MaterialPart {
    type Error = AlchemyError;

    fn try_from(wire: WireMaterial) -> Result<Self, Self::Error> {
        let kind = wire.material_type.as_str();
        match kind {
            "text" => Ok(MaterialPart::text(required(&wire.text, "text", kind)?)),
            "image" => Ok(MaterialPart::Image {
                source: media_source(required(&wire.image_url, "imageUrl", kind)?),
            }),
            "audio" => Ok(MaterialPart::Audio {
                source: media_source(required(&wire.audio_url, "audioUrl", kind)?),
            }),
            "video" => Ok(MaterialPart::Video {
                source: media_source(required(&wire.video_url, "videoUrl", kind)?),
            }),
            "document" => Ok(MaterialPart::document_text(required(
                &wire.document_text,
                "documentText",
                kind,
            )?)),
            "data" => {
                let format: DataFormat = required(&wire.data_format, "dataFormat", kind)?.parse()?;
                let content = required(&wire.data_content, "dataContent", kind)?;
                Ok(MaterialPart::Data {
                    format,
                    content: content.to_string(),
                    label: wire.data_label,
                })
            }
            other => Err(AlchemyError::InvalidInput(format!(
                "Unknown material type '{other}'"
            ))),
        }
    }
}

/// Convert a whole wire array, failing on the first bad entry.
pub fn materials_from_wire(
    materials: impl IntoIterator<Item = WireMaterial>,
) -> Result<Vec<MaterialPart>, AlchemyError> {
    materials
        .into_iter()
        .enumerate()
        .map(|(index, wire)| {
            MaterialPart::try_from(wire).map_err(|e| match e {
                AlchemyError::InvalidInput(msg) => {
                    AlchemyError::InvalidInput(format!("materials[{index}]: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}
