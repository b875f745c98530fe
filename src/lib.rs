//! # Alchemy - provider-agnostic LLM recipes
//!
//! Alchemy turns heterogeneous content ("materials": text, images, audio,
//! video, documents, tabular data) into LLM completions through declarative
//! [`Recipe`]s, and hides the differences between vendor APIs behind one
//! [`Transmuter`] trait.
//!
//! ## Pipeline
//!
//! ```text
//! input -> spell -> transforms -> transmuter -> refiner -> output
//! ```
//!
//! - **Spell**: the recipe's prompt builder; returns text, a part or a part list
//! - **Transforms**: ordered rewrites of the part list (truncate, fetch, filter ...)
//! - **Transmuter**: one vendor call (OpenAI, Anthropic, Gemini), optionally streamed
//! - **Refiner**: raw text to a typed result (trimmed text or schema-checked JSON)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alchemy::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AlchemyError> {
//!     let alchemist = Alchemist::new(OpenAiTransmuter::from_env()?);
//!
//!     let summarize = Recipe::new(
//!         "summarize",
//!         |text: String| format!("Summarize in one sentence:\n{text}"),
//!         TextRefiner,
//!     )
//!     .with_catalyst(CatalystConfig::new().with_temperature(0.2))
//!     .with_transform(truncate_text(4_000));
//!
//!     let summary = alchemist
//!         .transmute(&summarize, "Rust is a systems language...".into(), TransmuteOptions::new())
//!         .await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod alchemist;
pub mod error;
pub mod recipe;
pub mod refiners;
pub mod telemetry;
pub mod transforms;
pub mod transmuters;
pub mod types;
pub mod utils;

pub use alchemist::{Alchemist, Transmuted};
pub use error::{AlchemyError, ErrorKind};
pub use recipe::{PromptTemplate, Recipe};
pub use refiners::{JsonRefiner, Refiner, Schema, TextRefiner};
pub use transforms::MaterialTransform;
pub use transmuters::Transmuter;

/// Convenient re-exports of the common API surface.
pub mod prelude {
    pub use crate::alchemist::{Alchemist, Transmuted};
    pub use crate::error::{AlchemyError, ErrorKind};
    pub use crate::recipe::{PromptTemplate, Recipe};
    pub use crate::refiners::{JsonRefiner, Refiner, Schema, TextRefiner};
    pub use crate::transforms::{
        MaterialTransform, MediaConversionOptions, SharedTransform, TransformContext,
        audio_to_text, document_to_text, filter_by_type, image_url_to_base64, parse_transform,
        parse_transforms, prepend_text, transform_fn, truncate_text, video_to_frames,
    };
    pub use crate::transmuters::{
        AnthropicConfig, AnthropicTransmuter, GeminiConfig, GeminiTransmuter, OpenAiConfig,
        OpenAiTransmuter, Transmuter,
    };
    pub use crate::types::{
        CatalystConfig, DataFormat, DocumentSource, MaterialPart, MediaSource, NamedCatalyst,
        SpellOutput, TextStream, TransmutationResult, TransmuteOptions, Usage, WireMaterial,
        extract_all_text, extract_text, is_text_only, materials_from_wire, normalize_spell_output,
    };
    pub use tokio_util::sync::CancellationToken;
}
