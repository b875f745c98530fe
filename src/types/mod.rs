//! Core data types shared by every pipeline stage.

pub mod catalyst;
pub mod material;
pub mod tools;
pub mod transmutation;
pub mod wire;

pub use catalyst::{CatalystConfig, NamedCatalyst, find_catalyst, merge_catalysts};
pub use material::{
    CustomMaterial, DataFormat, DocumentSource, ExtensionPart, MaterialPart, MediaSource,
    SpellOutput, TEXT_SEPARATOR, extract_all_text, extract_text, is_text_only,
    normalize_spell_output,
};
pub use tools::ToolDefinition;
pub use transmutation::{TextStream, TransmutationResult, TransmuteOptions, Usage};
pub use wire::{WireMaterial, materials_from_wire};
