//! Literal `{{name}}` prompt templates.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::AlchemyError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}").expect("valid placeholder regex")
});

/// A prompt with `{{variable}}` placeholders.
///
/// Substitution is literal: string values are inserted as-is, any other JSON
/// value as its compact JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.source) {
            if let Some(name) = caps.get(1).map(|m| m.as_str())
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        names
    }

    /// Substitute every placeholder from a JSON object.
    pub fn render(&self, vars: &Value) -> Result<String, AlchemyError> {
        let Some(map) = vars.as_object() else {
            return Err(AlchemyError::InvalidInput(
                "Template variables must be a JSON object".to_string(),
            ));
        };

        if let Some(missing) = self.variables().into_iter().find(|name| !map.contains_key(*name)) {
            return Err(AlchemyError::InvalidInput(format!(
                "Unknown template variable '{missing}'"
            )));
        }

        let rendered = PLACEHOLDER.replace_all(&self.source, |caps: &regex::Captures<'_>| {
            match map.get(&caps[1]) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            }
        });
        Ok(rendered.into_owned())
    }
}
