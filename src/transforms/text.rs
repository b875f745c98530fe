//! Pure list transforms: truncate, prepend, filter.

use async_trait::async_trait;
use std::collections::HashSet;

use super::{MaterialTransform, TransformContext};
use crate::error::AlchemyError;
use crate::types::MaterialPart;

/// Default suffix appended to truncated text.
pub const DEFAULT_TRUNCATION_SUFFIX: &str = "…";

/// Cuts long text parts. See [`truncate_text`].
#[derive(Debug, Clone)]
pub struct TruncateText {
    max_length: usize,
    suffix: String,
}

impl TruncateText {
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

/// Keep the first `max_length` characters of every longer text part and append
/// the suffix (`…` by default).
///
/// Length is counted in Unicode scalar values, so a code point is never split.
/// The suffix is not counted against `max_length`.
pub fn truncate_text(max_length: usize) -> TruncateText {
    TruncateText {
        max_length,
        suffix: DEFAULT_TRUNCATION_SUFFIX.to_string(),
    }
}

fn truncate(text: String, max_length: usize, suffix: &str) -> String {
    match text.char_indices().nth(max_length) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + suffix.len());
            out.push_str(&text[..cut]);
            out.push_str(suffix);
            out
        }
        None => text,
    }
}

#[async_trait]
impl MaterialTransform for TruncateText {
    fn name(&self) -> &str {
        "truncate_text"
    }

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        _ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError> {
        Ok(parts
            .into_iter()
            .map(|part| match part {
                MaterialPart::Text { text } => MaterialPart::Text {
                    text: truncate(text, self.max_length, &self.suffix),
                },
                other => other,
            })
            .collect())
    }
}

/// Inserts a leading text part. See [`prepend_text`].
#[derive(Debug, Clone)]
pub struct PrependText {
    text: String,
}

/// Insert one text part at the front of the list.
pub fn prepend_text(text: impl Into<String>) -> PrependText {
    PrependText { text: text.into() }
}

#[async_trait]
impl MaterialTransform for PrependText {
    fn name(&self) -> &str {
        "prepend_text"
    }

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        _ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError> {
        let mut out = Vec::with_capacity(parts.len() + 1);
        out.push(MaterialPart::text(self.text.clone()));
        out.extend(parts);
        Ok(out)
    }
}

/// Keeps parts of the given types. See [`filter_by_type`].
#[derive(Debug, Clone)]
pub struct FilterByType {
    types: HashSet<String>,
}

/// Keep only parts whose `type` is listed, preserving relative order.
///
/// Extension part types are matched by their registered name.
pub fn filter_by_type<I, S>(types: I) -> FilterByType
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FilterByType {
        types: types.into_iter().map(Into::into).collect(),
    }
}

#[async_trait]
impl MaterialTransform for FilterByType {
    fn name(&self) -> &str {
        "filter_by_type"
    }

    async fn apply(
        &self,
        parts: Vec<MaterialPart>,
        _ctx: &TransformContext,
    ) -> Result<Vec<MaterialPart>, AlchemyError> {
        Ok(parts
            .into_iter()
            .filter(|part| self.types.contains(part.part_type()))
            .collect())
    }
}
