use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::LazyLock;

use super::{Refiner, Schema};
use crate::error::{AlchemyError, SchemaViolation};

/// Instructions used when the schema has no renderable shape.
pub const GENERIC_JSON_INSTRUCTIONS: &str =
    "Respond with valid JSON only. Do not include any other text or markdown code fences.";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*```(?:json|JSON)?[ \t]*\r?\n?(.*?)\r?\n?[ \t]*```\s*\z")
        .expect("valid code fence regex")
});

/// Remove one surrounding ```` ``` ```` / ```` ```json ```` fence, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    match CODE_FENCE.captures(raw).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => raw.trim(),
    }
}

/// Parses model output as JSON and validates it against a [`Schema`].
///
/// `T` defaults to [`serde_json::Value`]; any `DeserializeOwned` type works
/// once the value has passed schema validation.
#[derive(Debug, Clone)]
pub struct JsonRefiner<T = Value> {
    schema: Schema,
    _output: PhantomData<fn() -> T>,
}

impl<T> JsonRefiner<T> {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            _output: PhantomData,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn validate(&self, value: &Value) -> Result<(), AlchemyError> {
        let validator = jsonschema::validator_for(&self.schema.to_json_schema()).map_err(|e| {
            let violation = SchemaViolation {
                violations: vec![e.to_string()],
            };
            AlchemyError::refine("Schema could not be compiled", violation)
        })?;

        let violations: Vec<String> = validator
            .iter_errors(value)
            .take(3)
            .map(|e| e.to_string())
            .collect();
        if violations.is_empty() {
            return Ok(());
        }

        let violation = SchemaViolation { violations };
        Err(AlchemyError::refine(
            format!("Output does not match schema: {}", violation.violations.join("; ")),
            violation,
        ))
    }
}

impl<T> Refiner for JsonRefiner<T>
where
    T: DeserializeOwned + Send,
{
    type Output = T;

    fn refine(&self, raw: &str) -> Result<T, AlchemyError> {
        let body = strip_code_fence(raw);
        let value: Value = serde_json::from_str(body)
            .map_err(|e| AlchemyError::refine(format!("Failed to parse JSON: {e}"), e))?;

        self.validate(&value)?;

        serde_json::from_value(value)
            .map_err(|e| AlchemyError::refine(format!("Failed to deserialize output: {e}"), e))
    }

    fn format_instructions(&self) -> Option<String> {
        Some(match self.schema.describe() {
            Some(shape) => format!(
                "Respond with valid JSON only, matching this shape:\n{shape}\n\
                 Do not include any other text or markdown code fences."
            ),
            None => GENERIC_JSON_INSTRUCTIONS.to_string(),
        })
    }
}
