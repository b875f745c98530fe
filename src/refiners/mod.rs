//! Refiners - turn raw model text into typed results
//!
//! A refiner may also expose format instructions, which the alchemist
//! appends to the prompt to steer the model towards a parseable answer.
//! Format instructions are prompt text, never data.

use crate::error::AlchemyError;

mod json;
mod schema;
mod text;

pub use json::{GENERIC_JSON_INSTRUCTIONS, JsonRefiner, strip_code_fence};
pub use schema::{Field, Schema};
pub use text::{TEXT_FORMAT_INSTRUCTIONS, TextRefiner};

/// Post-processes raw model output.
pub trait Refiner: Send + Sync {
    type Output: Send;

    fn refine(&self, raw: &str) -> Result<Self::Output, AlchemyError>;

    /// Text appended to the prompt, if any.
    fn format_instructions(&self) -> Option<String> {
        None
    }
}
