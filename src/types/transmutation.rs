//! Transmutation options and results

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use super::catalyst::CatalystConfig;
use crate::error::AlchemyError;

/// Incremental text chunks, in vendor arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, AlchemyError>> + Send>>;

/// Token accounting in the shared shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Raw output of one vendor call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransmutationResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl TransmutationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Per-call options handed to a transmuter.
#[derive(Debug, Clone, Default)]
pub struct TransmuteOptions {
    pub catalyst: Option<CatalystConfig>,
    /// Target response language, e.g. `"French"`
    pub language: Option<String>,
    /// Cancelling this token aborts the in-flight vendor call
    pub cancel: Option<CancellationToken>,
}

impl TransmuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalyst(mut self, catalyst: CatalystConfig) -> Self {
        self.catalyst = Some(catalyst);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
