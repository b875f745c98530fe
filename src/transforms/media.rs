//! Audio and video conversions.
//!
//! Neither conversion has a backend in this crate. By default they fail on
//! the first matching part instead of inventing a transcript; `stub: true`
//! substitutes a fixed placeholder so pipelines can run end to end in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{MaterialTransform, TransformContext};
use crate::error::AlchemyError;
use crate::types::MaterialPart;

/// Placeholder emitted by `audio_to_text` with `stub: true`.
pub const AUDIO_STUB_TEXT: &str = "[Audio transcription placeholder]";

/// Placeholder emitted by `video_to_frames` with `stub: true`.
pub const VIDEO_STUB_TEXT: &str = "[Video frames placeholder]";

/// Options shared by the media conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConversionOptions {
    /// Substitute a placeholder text part instead of failing.
    #[serde(default)]
    pub stub: bool,
}

impl MediaConversionOptions {
    pub const fn stub() -> Self {
        Self { stub: true }
    }
}

/// See [`audio_to_text`].
#[derive(Debug, Clone, Default)]
pub struct AudioToText {
    options: MediaConversionOptions,
}

/// Convert audio parts to text transcripts.
pub fn audio_to_text(options: MediaConversionOptions) -> AudioToText {
    AudioToText { options }
}

/// See [`video_to_frames`].
#[derive(Debug, Clone, Default)]
pub struct VideoToFrames {
    options: MediaConversionOptions,
}

/// Convert video parts to extracted frames.
pub fn video_to_frames(options: MediaConversionOptions) -> VideoToFrames {
    VideoToFrames { options }
}

fn convert(
    parts: Vec<MaterialPart>,
    target: &str,
    transform: &str,
    integration: &str,
    stub: Option<&str>,
) -> Result<Vec<MaterialPart>, AlchemyError> {
    parts
        .into_iter()
        .map(|part| {
            if part.part_type() != target {
                return Ok(part);
            }
            match stub {
                Some(placeholder) => Ok(MaterialPart::text(placeholder)),
                None => Err(AlchemyError::transform(
                    transform,
                    format!(
                        "{transform} requires integration with a {integration} service; \
                         pass `stub: true` to substitute a placeholder"
                    ),
                )),
            }
        })
        .collect()
}

#[async_trait]
impl MaterialTransform for AudioToText {
    fn name(&self) -> &str {
        "audio_to_text"
    }

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        _ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError> {
        let stub = self.options.stub.then_some(AUDIO_STUB_TEXT);
        convert(parts, "audio", self.name(), "speech-to-text", stub)
    }
}

#[async_trait]
impl MaterialTransform for VideoToFrames {
    fn name(&self) -> &str {
        "video_to_frames"
    }

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        _ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError> {
        let stub = self.options.stub.then_some(VIDEO_STUB_TEXT);
        convert(parts, "video", self.name(), "frame-extraction", stub)
    }
}
