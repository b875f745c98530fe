//! Tool definitions carried by recipes
//!
//! Recipes may declare tools for future agentic use. The pipeline carries
//! them along but never sends or executes them.

use serde::{Deserialize, Serialize};

/// A function the model could be offered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name
    pub name: String,
    /// What the function does
    pub description: String,
    /// JSON schema for function parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}
