//! Structural schema description
//!
//! A small closed set of node kinds that can (1) render itself as
//! human-readable JSON-shape text for prompting and (2) compile to JSON Schema
//! for validation.

use serde_json::{Map, Value, json};

/// One node of a structural schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String,
    Number,
    Integer,
    Boolean,
    /// One of the listed string literals
    Enum(Vec<String>),
    /// Homogeneous array
    Array(Box<Schema>),
    /// Object with ordered fields
    Object(Vec<Field>),
    /// Any JSON value; cannot be described structurally
    Any,
}

/// A named object field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

impl Schema {
    pub fn object() -> Self {
        Self::Object(Vec::new())
    }

    pub fn array_of(item: Schema) -> Self {
        Self::Array(Box::new(item))
    }

    pub fn one_of<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(literals.into_iter().map(Into::into).collect())
    }

    /// Add a required field. No-op on non-object schemas.
    pub fn field(self, name: impl Into<String>, schema: Schema) -> Self {
        self.push_field(name.into(), schema, true)
    }

    /// Add an optional field. No-op on non-object schemas.
    pub fn optional_field(self, name: impl Into<String>, schema: Schema) -> Self {
        self.push_field(name.into(), schema, false)
    }

    fn push_field(mut self, name: String, schema: Schema, required: bool) -> Self {
        if let Self::Object(fields) = &mut self {
            fields.push(Field {
                name,
                schema,
                required,
            });
        }
        self
    }

    /// Render the compact shape text, e.g. `{"name": string, "tags": string[]}`.
    ///
    /// Only object schemas are rendered; everything else yields `None`.
    pub fn describe(&self) -> Option<String> {
        match self {
            Self::Object(_) => Some(self.render()),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Number => "number".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Any => "any".to_string(),
            Self::Enum(literals) => literals
                .iter()
                .map(|l| Value::String(l.clone()).to_string())
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Array(item) => match item.as_ref() {
                Self::Enum(_) => format!("({})[]", item.render()),
                other => format!("{}[]", other.render()),
            },
            Self::Object(fields) => {
                let body = fields
                    .iter()
                    .map(|f| {
                        let name = Value::String(f.name.clone());
                        let marker = if f.required { "" } else { "?" };
                        format!("{name}{marker}: {}", f.schema.render())
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{body}}}")
            }
        }
    }

    /// Compile to a JSON Schema document.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::String => json!({"type": "string"}),
            Self::Number => json!({"type": "number"}),
            Self::Integer => json!({"type": "integer"}),
            Self::Boolean => json!({"type": "boolean"}),
            Self::Any => json!({}),
            Self::Enum(literals) => json!({"type": "string", "enum": literals}),
            Self::Array(item) => json!({"type": "array", "items": item.to_json_schema()}),
            Self::Object(fields) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for field in fields {
                    properties.insert(field.name.clone(), field.schema.to_json_schema());
                    if field.required {
                        required.push(Value::String(field.name.clone()));
                    }
                }
                json!({"type": "object", "properties": properties, "required": required})
            }
        }
    }
}
