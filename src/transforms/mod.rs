//! Material transforms
//!
//! A transform rewrites a part list before it reaches a model. Transforms
//! compose by sequential application: [`run_transforms`] feeds each one the
//! previous output, and the first failure aborts the run.
//!
//! ```rust,ignore
//! use alchemy::transforms::{filter_by_type, run_transforms, truncate_text, TransformContext};
//!
//! let transforms = vec![truncate_text(280).boxed(), filter_by_type(["text", "image"]).boxed()];
//! let parts = run_transforms(&transforms, parts, &TransformContext::new("summarize")).await?;
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::AlchemyError;
use crate::types::{CatalystConfig, MaterialPart};

mod fetch;
mod media;
mod parse;
mod text;

pub use fetch::{DocumentToText, ImageUrlToBase64, document_to_text, image_url_to_base64};
pub use media::{
    AUDIO_STUB_TEXT, AudioToText, MediaConversionOptions, VIDEO_STUB_TEXT, VideoToFrames,
    audio_to_text, video_to_frames,
};
pub use parse::{parse_transform, parse_transforms};
pub use text::{FilterByType, PrependText, TruncateText, filter_by_type, prepend_text, truncate_text};

/// Shared transform handle, as stored by recipes.
pub type SharedTransform = Arc<dyn MaterialTransform>;

/// What a transform knows about the call it runs in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformContext {
    pub recipe_id: String,
    pub catalyst: Option<CatalystConfig>,
}

impl TransformContext {
    pub fn new(recipe_id: impl Into<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            catalyst: None,
        }
    }

    pub fn with_catalyst(mut self, catalyst: Option<CatalystConfig>) -> Self {
        self.catalyst = catalyst;
        self
    }
}

/// Rewrites a material list.
///
/// Implementations take ownership of the incoming list and return a new one;
/// the caller never observes a half-applied transform.
#[async_trait]
pub trait MaterialTransform: Send + Sync {
    /// Name used in logs and `TransformError`s.
    fn name(&self) -> &str;

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError>;

    /// Wrap into a shareable handle.
    fn boxed(self) -> SharedTransform
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

/// Transform backed by a synchronous closure.
pub struct FnTransform<F> {
    name: String,
    func: F,
}

#[async_trait]
impl<F> MaterialTransform for FnTransform<F>
where
    F: Fn(Vec<MaterialPart>, &TransformContext) -> Result<Vec<MaterialPart>, AlchemyError>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError> {
        (self.func)(parts, ctx)
    }
}

/// Adapt a closure into a [`MaterialTransform`].
pub fn transform_fn<F>(name: impl Into<String>, func: F) -> FnTransform<F>
where
    F: Fn(Vec<MaterialPart>, &TransformContext) -> Result<Vec<MaterialPart>, AlchemyError>
        + Send
        + Sync,
{
    FnTransform {
        name: name.into(),
        func,
    }
}

/// Apply transforms strictly in list order.
pub async fn run_transforms(
    transforms: &[SharedTransform],
    parts: Vec<MaterialPart>,
    ctx: &TransformContext,
) -> Result<Vec<MaterialPart>, AlchemyError> {
    let mut current = parts;
    for transform in transforms {
        let before = current.len();
        current = transform.apply(current, ctx).await.inspect_err(|e| {
            tracing::debug!(
                target: "alchemy::transforms",
                recipe = %ctx.recipe_id,
                transform = transform.name(),
                error = %e,
                "transform failed"
            );
        })?;
        tracing::debug!(
            target: "alchemy::transforms",
            recipe = %ctx.recipe_id,
            transform = transform.name(),
            before,
            after = current.len(),
            "transform applied"
        );
    }
    Ok(current)
}
