//! Material parts - provider-agnostic multimodal content
//!
//! A prompt is a list of [`MaterialPart`]s. The core variants cover text,
//! media, documents and tabular data; callers add their own part types through
//! [`MaterialPart::Extension`] without touching the core enum.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Separator used whenever several text parts collapse into one string.
pub const TEXT_SEPARATOR: &str = "\n\n";

/// Media source for image, audio and video parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaSource {
    /// Remote resource (http, https, gs ...)
    Url { url: String },
    /// Inline base64 payload
    Base64 {
        #[serde(rename = "mediaType")]
        media_type: String,
        data: String,
    },
}

impl MediaSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    pub fn base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Base64 {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes into a base64 source.
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        use base64::{Engine, engine::general_purpose::STANDARD};
        Self::base64(media_type, STANDARD.encode(bytes))
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url { url } => Some(url),
            Self::Base64 { .. } => None,
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url { .. })
    }

    /// Render as a `data:` URL, the form most vendors accept inline.
    pub fn to_data_url(&self) -> Option<String> {
        match self {
            Self::Base64 { media_type, data } => Some(format!("data:{media_type};base64,{data}")),
            Self::Url { .. } => None,
        }
    }
}

/// Source of a document part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocumentSource {
    /// Remote document, fetched by `document_to_text`
    Url { url: String },
    /// Inline document text with optional metadata (rendered in key order)
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<BTreeMap<String, String>>,
    },
}

/// Tabular payload format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Json,
    Tsv,
}

impl DataFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Tsv => "tsv",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataFormat {
    type Err = crate::error::AlchemyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "tsv" => Ok(Self::Tsv),
            other => Err(crate::error::AlchemyError::InvalidInput(format!(
                "Unknown data format '{other}', expected csv, json or tsv"
            ))),
        }
    }
}

/// A caller-defined part type.
///
/// Transforms pass extension parts through untouched; transmuters reject
/// them with `UnsupportedPartType` unless a transform converted them first.
pub trait CustomMaterial: fmt::Debug + Send + Sync + 'static {
    /// Discriminant name, e.g. `"spreadsheet"`.
    fn part_type(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a [`CustomMaterial`]. Equality is identity.
#[derive(Debug, Clone)]
pub struct ExtensionPart(Arc<dyn CustomMaterial>);

impl ExtensionPart {
    pub fn new(material: impl CustomMaterial) -> Self {
        Self(Arc::new(material))
    }

    pub fn part_type(&self) -> &str {
        self.0.part_type()
    }

    /// Downcast to the concrete material type.
    pub fn downcast_ref<T: CustomMaterial>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for ExtensionPart {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One unit of model input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MaterialPart {
    Text {
        text: String,
    },
    Image {
        source: MediaSource,
    },
    Audio {
        source: MediaSource,
    },
    Video {
        source: MediaSource,
    },
    Document {
        source: DocumentSource,
    },
    Data {
        format: DataFormat,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Caller-registered part type; not serializable.
    #[serde(skip)]
    Extension(ExtensionPart),
}

impl MaterialPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::Image {
            source: MediaSource::url(url),
        }
    }

    pub fn image_base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Image {
            source: MediaSource::base64(media_type, data),
        }
    }

    pub fn audio_url(url: impl Into<String>) -> Self {
        Self::Audio {
            source: MediaSource::url(url),
        }
    }

    pub fn video_url(url: impl Into<String>) -> Self {
        Self::Video {
            source: MediaSource::url(url),
        }
    }

    pub fn document_url(url: impl Into<String>) -> Self {
        Self::Document {
            source: DocumentSource::Url { url: url.into() },
        }
    }

    pub fn document_text(text: impl Into<String>) -> Self {
        Self::Document {
            source: DocumentSource::Text {
                text: text.into(),
                metadata: None,
            },
        }
    }

    pub fn document_with_metadata(
        text: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self::Document {
            source: DocumentSource::Text {
                text: text.into(),
                metadata: Some(metadata),
            },
        }
    }

    pub fn data(format: DataFormat, content: impl Into<String>) -> Self {
        Self::Data {
            format,
            content: content.into(),
            label: None,
        }
    }

    pub fn labeled_data(format: DataFormat, content: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Data {
            format,
            content: content.into(),
            label: Some(label.into()),
        }
    }

    pub fn extension(material: impl CustomMaterial) -> Self {
        Self::Extension(ExtensionPart::new(material))
    }

    /// The `type` discriminant.
    pub fn part_type(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Audio { .. } => "audio",
            Self::Video { .. } => "video",
            Self::Document { .. } => "document",
            Self::Data { .. } => "data",
            Self::Extension(ext) => ext.part_type(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// What a recipe's spell produces before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum SpellOutput {
    Text(String),
    Part(MaterialPart),
    Parts(Vec<MaterialPart>),
}

impl From<String> for SpellOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for SpellOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<MaterialPart> for SpellOutput {
    fn from(part: MaterialPart) -> Self {
        Self::Part(part)
    }
}

impl From<Vec<MaterialPart>> for SpellOutput {
    fn from(parts: Vec<MaterialPart>) -> Self {
        Self::Parts(parts)
    }
}

/// Normalize a spell output into a part list.
///
/// A `Vec` is handed back as-is, without copying.
pub fn normalize_spell_output(output: impl Into<SpellOutput>) -> Vec<MaterialPart> {
    match output.into() {
        SpellOutput::Text(text) => vec![MaterialPart::text(text)],
        SpellOutput::Part(part) => vec![part],
        SpellOutput::Parts(parts) => parts,
    }
}

/// Join the text of all `text` parts with a blank line.
pub fn extract_text(parts: &[MaterialPart]) -> String {
    parts
        .iter()
        .filter_map(MaterialPart::as_text)
        .collect::<Vec<_>>()
        .join(TEXT_SEPARATOR)
}

/// Like [`extract_text`], but also surfaces inline document text and raw data content.
pub fn extract_all_text(parts: &[MaterialPart]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            MaterialPart::Text { text } => Some(text.as_str()),
            MaterialPart::Document {
                source: DocumentSource::Text { text, .. },
            } => Some(text.as_str()),
            MaterialPart::Data { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(TEXT_SEPARATOR)
}

/// True when every part is text; vacuously true for an empty list.
pub fn is_text_only(parts: &[MaterialPart]) -> bool {
    parts.iter().all(MaterialPart::is_text)
}
