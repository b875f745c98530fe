use super::Refiner;
use crate::error::AlchemyError;

/// Instructions exposed by [`TextRefiner`].
pub const TEXT_FORMAT_INSTRUCTIONS: &str =
    "Respond in plain text only. Do not use JSON or markdown formatting.";

/// Trims surrounding whitespace; everything else is kept verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRefiner;

impl TextRefiner {
    pub fn new() -> Self {
        Self
    }
}

impl Refiner for TextRefiner {
    type Output = String;

    fn refine(&self, raw: &str) -> Result<String, AlchemyError> {
        Ok(raw.trim().to_string())
    }

    fn format_instructions(&self) -> Option<String> {
        Some(TEXT_FORMAT_INSTRUCTIONS.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_only_the_edges() {
        let refiner = TextRefiner::new();
        assert_eq!(refiner.refine("  hello world  ").unwrap(), "hello world");
        assert_eq!(refiner.refine("").unwrap(), "");
        assert_eq!(refiner.refine("\n a  b\n\nc \t").unwrap(), "a  b\n\nc");
    }

    #[test]
    fn instructions_ask_for_plain_text() {
        let instructions = TextRefiner.format_instructions().unwrap();
        assert!(instructions.contains("plain text"));
    }
}
