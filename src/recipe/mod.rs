//! Recipes - reusable prompt + configuration + refiner bundles
//!
//! A recipe is immutable configuration: build it once, share it across any
//! number of concurrent invocations.
//!
//! ```rust,ignore
//! use alchemy::prelude::*;
//!
//! let haiku = Recipe::new("haiku", |topic: String| format!("Write a haiku about {topic}."), TextRefiner)
//!     .with_name("Haiku")
//!     .with_catalyst(CatalystConfig::new().with_temperature(0.9))
//!     .with_transform(truncate_text(2_000));
//! ```

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::AlchemyError;
use crate::refiners::Refiner;
use crate::transforms::{MaterialTransform, SharedTransform};
use crate::types::{CatalystConfig, SpellOutput, ToolDefinition};

mod template;

pub use template::PromptTemplate;

/// Future returned by a spell.
pub type SpellFuture = BoxFuture<'static, Result<SpellOutput, AlchemyError>>;

/// Prompt builder: input in, spell output out.
pub type Spell<I> = Arc<dyn Fn(I) -> SpellFuture + Send + Sync>;

/// See the module docs.
pub struct Recipe<I, R> {
    pub id: String,
    pub name: Option<String>,
    /// Default catalyst; per-call overrides win field by field
    pub catalyst: Option<CatalystConfig>,
    pub refiner: R,
    /// Applied in order before the parts reach a transmuter
    pub transforms: Vec<SharedTransform>,
    /// Reserved; not consumed by the pipeline
    pub tools: Vec<ToolDefinition>,
    spell: Spell<I>,
}

impl<I, R> Recipe<I, R>
where
    R: Refiner,
{
    /// Recipe with a synchronous, infallible spell.
    pub fn new<F, S>(id: impl Into<String>, spell: F, refiner: R) -> Self
    where
        F: Fn(I) -> S + Send + Sync + 'static,
        S: Into<SpellOutput>,
    {
        let spell: Spell<I> = Arc::new(move |input| {
            let output = spell(input).into();
            Box::pin(futures::future::ready(Ok(output)))
        });
        Self::from_spell(id, spell, refiner)
    }

    /// Recipe whose spell is asynchronous and may fail.
    pub fn with_async_spell<F, Fut>(id: impl Into<String>, spell: F, refiner: R) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SpellOutput, AlchemyError>> + Send + 'static,
    {
        let spell: Spell<I> = Arc::new(move |input| Box::pin(spell(input)));
        Self::from_spell(id, spell, refiner)
    }

    pub fn from_spell(id: impl Into<String>, spell: Spell<I>, refiner: R) -> Self {
        Self {
            id: id.into(),
            name: None,
            catalyst: None,
            refiner,
            transforms: Vec::new(),
            tools: Vec::new(),
            spell,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_catalyst(mut self, catalyst: CatalystConfig) -> Self {
        self.catalyst = Some(catalyst);
        self
    }

    pub fn with_transform(mut self, transform: impl MaterialTransform + 'static) -> Self {
        self.transforms.push(transform.boxed());
        self
    }

    pub fn with_transforms(mut self, transforms: impl IntoIterator<Item = SharedTransform>) -> Self {
        self.transforms.extend(transforms);
        self
    }

    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    /// Run the spell on an input.
    pub async fn cast(&self, input: I) -> Result<SpellOutput, AlchemyError> {
        (self.spell)(input).await
    }

    /// Human-facing label: the name when set, the id otherwise.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl<R> Recipe<serde_json::Value, R>
where
    R: Refiner,
{
    /// Recipe whose spell renders a [`PromptTemplate`] from a JSON object input.
    pub fn from_template(id: impl Into<String>, template: PromptTemplate, refiner: R) -> Self {
        let template = Arc::new(template);
        Self::with_async_spell(
            id,
            move |vars: serde_json::Value| {
                let rendered = template.render(&vars).map(SpellOutput::Text);
                futures::future::ready(rendered)
            },
            refiner,
        )
    }
}

impl<I, R: Clone> Clone for Recipe<I, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            catalyst: self.catalyst.clone(),
            refiner: self.refiner.clone(),
            transforms: self.transforms.clone(),
            tools: self.tools.clone(),
            spell: Arc::clone(&self.spell),
        }
    }
}

impl<I, R> fmt::Debug for Recipe<I, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("catalyst", &self.catalyst)
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("tools_count", &self.tools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refiners::TextRefiner;
    use crate::transforms::truncate_text;
    use crate::types::MaterialPart;
    use serde_json::json;

    #[tokio::test]
    async fn sync_spells_produce_outputs() {
        let recipe = Recipe::new("greet", |name: String| format!("Hello, {name}!"), TextRefiner);
        assert_eq!(
            recipe.cast("Ada".into()).await.unwrap(),
            SpellOutput::Text("Hello, Ada!".into())
        );
        assert_eq!(recipe.label(), "greet");
    }

    #[tokio::test]
    async fn async_spells_may_fail() {
        let recipe = Recipe::with_async_spell(
            "describe",
            |url: String| async move {
                if url.is_empty() {
                    return Err(AlchemyError::InvalidInput("url is required".into()));
                }
                Ok(vec![MaterialPart::text("Describe:"), MaterialPart::image_url(url)].into())
            },
            TextRefiner,
        );
        assert!(recipe.cast(String::new()).await.is_err());
        let out = recipe.cast("https://example.com/a.png".into()).await.unwrap();
        assert!(matches!(out, SpellOutput::Parts(parts) if parts.len() == 2));
    }

    #[tokio::test]
    async fn template_recipes_render_inputs() {
        let recipe = Recipe::from_template(
            "translate",
            PromptTemplate::new("Translate '{{text}}' to {{lang}}."),
            TextRefiner,
        )
        .with_name("Translator")
        .with_transform(truncate_text(500));

        assert_eq!(recipe.label(), "Translator");
        assert_eq!(recipe.transforms.len(), 1);
        assert_eq!(
            recipe.cast(json!({"text": "bonjour", "lang": "English"})).await.unwrap(),
            SpellOutput::Text("Translate 'bonjour' to English.".into())
        );
        let err = recipe.cast(json!({"text": "bonjour"})).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn clones_share_the_spell() {
        let recipe = Recipe::new("r", |s: String| s, TextRefiner)
            .with_tool(ToolDefinition::new("lookup", "Look something up", json!({"type": "object"})));
        let copy = recipe.clone();
        assert!(Arc::ptr_eq(&recipe.spell, &copy.spell));
        assert_eq!(copy.tools.len(), 1);
    }
}
