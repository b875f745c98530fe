//! Catalysts - per-invocation model configuration

use serde::{Deserialize, Serialize};

/// Model configuration applied to one transmutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalystConfig {
    /// Role definition sent through the vendor's system channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_definition: Option<String>,
    /// Sampling temperature; `None` keeps the vendor default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Explicit model id; `None` uses the transmuter's default model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CatalystConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role_definition: impl Into<String>) -> Self {
        self.role_definition = Some(role_definition.into());
        self
    }

    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Field-wise merge: every field set on `overrides` wins.
    pub fn merge(&self, overrides: &CatalystConfig) -> CatalystConfig {
        CatalystConfig {
            role_definition: overrides
                .role_definition
                .clone()
                .or_else(|| self.role_definition.clone()),
            temperature: overrides.temperature.or(self.temperature),
            model: overrides.model.clone().or_else(|| self.model.clone()),
        }
    }
}

/// Merge an optional base with an optional override.
pub fn merge_catalysts(
    base: Option<&CatalystConfig>,
    overrides: Option<&CatalystConfig>,
) -> Option<CatalystConfig> {
    match (base, overrides) {
        (Some(base), Some(overrides)) => Some(base.merge(overrides)),
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (None, None) => None,
    }
}

/// A catalyst preset selectable by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCatalyst {
    pub key: String,
    pub label: String,
    pub config: CatalystConfig,
}

impl NamedCatalyst {
    pub fn new(key: impl Into<String>, label: impl Into<String>, config: CatalystConfig) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            config,
        }
    }
}

/// Look up a preset by key.
pub fn find_catalyst<'a>(presets: &'a [NamedCatalyst], key: &str) -> Option<&'a NamedCatalyst> {
    presets.iter().find(|preset| preset.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_fields_win() {
        let base = CatalystConfig::new()
            .with_role("You are a poet.")
            .with_temperature(0.2)
            .with_model("gpt-4o-mini");
        let overrides = CatalystConfig::new().with_temperature(0.9);
        let merged = base.merge(&overrides);
        assert_eq!(merged.role_definition.as_deref(), Some("You are a poet."));
        assert_eq!(merged.temperature, Some(0.9));
        assert_eq!(merged.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn merge_optional_sides() {
        let only = CatalystConfig::new().with_model("m");
        assert_eq!(merge_catalysts(None, None), None);
        assert_eq!(merge_catalysts(Some(&only), None), Some(only.clone()));
        assert_eq!(merge_catalysts(None, Some(&only)), Some(only));
    }

    #[test]
    fn presets_are_found_by_key() {
        let presets = vec![
            NamedCatalyst::new("terse", "Terse", CatalystConfig::new().with_role("Be brief.")),
            NamedCatalyst::new("creative", "Creative", CatalystConfig::new().with_temperature(1.0)),
        ];
        assert_eq!(find_catalyst(&presets, "creative").unwrap().label, "Creative");
        assert!(find_catalyst(&presets, "missing").is_none());
    }
}
