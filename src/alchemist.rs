//! Alchemist - the orchestrator
//!
//! Sequences one recipe invocation:
//!
//! 1. cast the spell and normalize its output to parts
//! 2. run the recipe's transforms in order
//! 3. append the refiner's format instructions as a trailing text part
//! 4. call the transmuter with the recipe catalyst merged under the caller's override
//! 5. refine the raw text
//!
//! Every failure propagates unchanged. Nothing is retried and no state is kept
//! between calls, so one `Alchemist` can serve any number of concurrent
//! invocations.

use std::sync::Arc;

use crate::error::AlchemyError;
use crate::recipe::Recipe;
use crate::refiners::Refiner;
use crate::transforms::{TransformContext, run_transforms};
use crate::transmuters::Transmuter;
use crate::types::{
    MaterialPart, TextStream, TransmuteOptions, Usage, merge_catalysts, normalize_spell_output,
};
use crate::utils::{cancellable_stream, with_cancellation};

/// Refined output together with the vendor's token accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Transmuted<T> {
    pub output: T,
    pub usage: Option<Usage>,
}

/// Runs recipes against one transmuter.
#[derive(Clone)]
pub struct Alchemist {
    transmuter: Arc<dyn Transmuter>,
}

impl std::fmt::Debug for Alchemist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alchemist")
            .field("transmuter", &self.transmuter.name())
            .finish()
    }
}

impl Alchemist {
    pub fn new(transmuter: impl Transmuter + 'static) -> Self {
        Self {
            transmuter: Arc::new(transmuter),
        }
    }

    pub fn from_shared(transmuter: Arc<dyn Transmuter>) -> Self {
        Self { transmuter }
    }

    pub fn transmuter(&self) -> &dyn Transmuter {
        self.transmuter.as_ref()
    }

    /// Run a recipe and return the refined result.
    pub async fn transmute<I, R>(
        &self,
        recipe: &Recipe<I, R>,
        input: I,
        options: TransmuteOptions,
    ) -> Result<R::Output, AlchemyError>
    where
        R: Refiner,
    {
        self.transmute_detailed(recipe, input, options)
            .await
            .map(|t| t.output)
    }

    /// Like [`Alchemist::transmute`], keeping the token usage.
    pub async fn transmute_detailed<I, R>(
        &self,
        recipe: &Recipe<I, R>,
        input: I,
        options: TransmuteOptions,
    ) -> Result<Transmuted<R::Output>, AlchemyError>
    where
        R: Refiner,
    {
        let (parts, options) = self.prepare(recipe, input, options).await?;

        let result = with_cancellation(
            options.cancel.as_ref(),
            self.transmuter.transmute(&parts, &options),
        )
        .await?;
        tracing::debug!(
            target: "alchemy::alchemist",
            recipe = %recipe.id,
            transmuter = self.transmuter.name(),
            chars = result.text.len(),
            "transmuted"
        );

        let output = recipe.refiner.refine(&result.text).inspect_err(|e| {
            tracing::debug!(target: "alchemy::alchemist", recipe = %recipe.id, error = %e, "refine failed");
        })?;
        Ok(Transmuted {
            output,
            usage: result.usage,
        })
    }

    /// Run a recipe and stream the raw text chunks.
    ///
    /// Fails before casting the spell when the transmuter cannot stream.
    /// Chunks are not refined.
    pub async fn stream<I, R>(
        &self,
        recipe: &Recipe<I, R>,
        input: I,
        options: TransmuteOptions,
    ) -> Result<TextStream, AlchemyError>
    where
        R: Refiner,
    {
        if !self.transmuter.supports_streaming() {
            return Err(AlchemyError::streaming_unsupported(self.transmuter.name()));
        }

        let (parts, options) = self.prepare(recipe, input, options).await?;
        tracing::debug!(
            target: "alchemy::alchemist",
            recipe = %recipe.id,
            transmuter = self.transmuter.name(),
            "streaming"
        );
        let stream =
            with_cancellation(options.cancel.as_ref(), self.transmuter.stream(&parts, &options))
                .await?;
        Ok(cancellable_stream(stream, options.cancel.clone()))
    }

    /// Steps 1 to 3, plus the merged catalyst for step 4.
    async fn prepare<I, R>(
        &self,
        recipe: &Recipe<I, R>,
        input: I,
        mut options: TransmuteOptions,
    ) -> Result<(Vec<MaterialPart>, TransmuteOptions), AlchemyError>
    where
        R: Refiner,
    {
        let catalyst = merge_catalysts(recipe.catalyst.as_ref(), options.catalyst.as_ref());
        let ctx = TransformContext::new(recipe.id.clone()).with_catalyst(catalyst.clone());

        let build = async {
            let parts = normalize_spell_output(recipe.cast(input).await?);
            tracing::debug!(target: "alchemy::alchemist", recipe = %recipe.id, parts = parts.len(), "spell cast");
            run_transforms(&recipe.transforms, parts, &ctx).await
        };
        let mut parts = with_cancellation(options.cancel.as_ref(), build).await?;

        if let Some(instructions) = recipe.refiner.format_instructions() {
            parts.push(MaterialPart::text(instructions));
        }

        options.catalyst = catalyst;
        Ok((parts, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::refiners::{JsonRefiner, Schema, TEXT_FORMAT_INSTRUCTIONS, TextRefiner};
    use crate::transforms::{filter_by_type, prepend_text, transform_fn, truncate_text};
    use crate::types::{CatalystConfig, TransmutationResult, extract_text};
    use async_trait::async_trait;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every call and answers with a fixed reply.
    #[derive(Default)]
    struct Echo {
        reply: String,
        streams: bool,
        calls: Mutex<Vec<(Vec<MaterialPart>, TransmuteOptions)>>,
    }

    impl Echo {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                ..Default::default()
            }
        }

        fn last_call(&self) -> (Vec<MaterialPart>, TransmuteOptions) {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Transmuter for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn transmute(
            &self,
            parts: &[MaterialPart],
            options: &TransmuteOptions,
        ) -> Result<TransmutationResult, AlchemyError> {
            self.calls
                .lock()
                .unwrap()
                .push((parts.to_vec(), options.clone()));
            Ok(TransmutationResult::new(self.reply.clone()).with_usage(Usage::new(3, 1)))
        }

        fn supports_streaming(&self) -> bool {
            self.streams
        }

        async fn stream(
            &self,
            parts: &[MaterialPart],
            options: &TransmuteOptions,
        ) -> Result<TextStream, AlchemyError> {
            if !self.streams {
                return Err(AlchemyError::streaming_unsupported(self.name()));
            }
            self.calls
                .lock()
                .unwrap()
                .push((parts.to_vec(), options.clone()));
            let chunks: Vec<Result<String, AlchemyError>> = self
                .reply
                .split_inclusive(' ')
                .map(|c| Ok(c.to_string()))
                .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    fn greet() -> Recipe<String, TextRefiner> {
        Recipe::new("greet", |name: String| format!("Say hello to {name}."), TextRefiner)
    }

    #[tokio::test]
    async fn text_recipes_are_trimmed_and_carry_the_spell_output() {
        let echo = Arc::new(Echo::replying("  hello  "));
        let alchemist = Alchemist::from_shared(echo.clone());

        let out = alchemist
            .transmute(&greet(), "Ada".into(), TransmuteOptions::new())
            .await
            .unwrap();
        assert_eq!(out, "hello");

        let (parts, _) = echo.last_call();
        let prompt = extract_text(&parts);
        assert!(prompt.starts_with("Say hello to Ada."));
        assert_eq!(prompt, format!("Say hello to Ada.\n\n{TEXT_FORMAT_INSTRUCTIONS}"));
    }

    #[tokio::test]
    async fn override_catalyst_wins_field_by_field() {
        let echo = Arc::new(Echo::replying("ok"));
        let alchemist = Alchemist::from_shared(echo.clone());
        let recipe = greet().with_catalyst(
            CatalystConfig::new()
                .with_role("You are cheerful.")
                .with_temperature(0.9),
        );

        let options = TransmuteOptions::new()
            .with_catalyst(CatalystConfig::new().with_temperature(0.1).with_model("m-2"))
            .with_language("French");
        alchemist.transmute(&recipe, "Bo".into(), options).await.unwrap();

        let (_, options) = echo.last_call();
        let catalyst = options.catalyst.unwrap();
        assert_eq!(catalyst.role_definition.as_deref(), Some("You are cheerful."));
        assert_eq!(catalyst.temperature, Some(0.1));
        assert_eq!(catalyst.model.as_deref(), Some("m-2"));
        assert_eq!(options.language.as_deref(), Some("French"));
    }

    #[tokio::test]
    async fn transforms_run_in_order_before_instructions_are_appended() {
        let echo = Arc::new(Echo::replying("{\"mood\": \"happy\"}"));
        let alchemist = Alchemist::from_shared(echo.clone());
        let recipe = Recipe::new(
            "mood",
            |text: String| {
                vec![
                    MaterialPart::text(text),
                    MaterialPart::image_url("https://example.com/face.png"),
                ]
            },
            JsonRefiner::<serde_json::Value>::new(
                Schema::object().field("mood", Schema::one_of(["happy", "sad"])),
            ),
        )
        .with_transform(filter_by_type(["text"]))
        .with_transform(prepend_text("Classify the mood."))
        .with_transform(truncate_text(5));

        let out = alchemist
            .transmute(&recipe, "I won the lottery".into(), TransmuteOptions::new())
            .await
            .unwrap();
        assert_eq!(out, json!({"mood": "happy"}));

        let (parts, _) = echo.last_call();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].as_text(), Some("Class…"));
        assert_eq!(parts[1].as_text(), Some("I won…"));
        assert!(parts[2].as_text().unwrap().contains(r#""mood": "happy" | "sad""#));
    }

    #[tokio::test]
    async fn transform_context_sees_recipe_and_catalyst() {
        let echo = Arc::new(Echo::replying("done"));
        let alchemist = Alchemist::from_shared(echo.clone());
        let recipe = greet()
            .with_catalyst(CatalystConfig::new().with_model("base"))
            .with_transform(transform_fn("stamp", |mut parts, ctx| {
                let model = ctx.catalyst.as_ref().and_then(|c| c.model.clone()).unwrap_or_default();
                parts.push(MaterialPart::text(format!("{}@{model}", ctx.recipe_id)));
                Ok(parts)
            }));

        alchemist
            .transmute(&recipe, "x".into(), TransmuteOptions::new())
            .await
            .unwrap();
        let (parts, _) = echo.last_call();
        assert_eq!(parts[1].as_text(), Some("greet@base"));
    }

    #[tokio::test]
    async fn stage_failures_propagate_unchanged() {
        let echo = Arc::new(Echo::replying("not json"));
        let alchemist = Alchemist::from_shared(echo.clone());

        let failing = greet().with_transform(transform_fn("explode", |_, _| {
            Err(AlchemyError::transform("explode", "boom"))
        }));
        let err = alchemist
            .transmute(&failing, "x".into(), TransmuteOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transform);
        assert!(echo.calls.lock().unwrap().is_empty());

        let json_recipe = Recipe::new(
            "json",
            |s: String| s,
            JsonRefiner::<serde_json::Value>::new(Schema::object().field("a", Schema::Number)),
        );
        let err = alchemist
            .transmute(&json_recipe, "x".into(), TransmuteOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Refine);
    }

    #[tokio::test]
    async fn detailed_results_keep_usage() {
        let alchemist = Alchemist::new(Echo::replying("hi"));
        let out = alchemist
            .transmute_detailed(&greet(), "x".into(), TransmuteOptions::new())
            .await
            .unwrap();
        assert_eq!(out.output, "hi");
        assert_eq!(out.usage, Some(Usage::new(3, 1)));
    }

    #[tokio::test]
    async fn stream_rejects_non_streaming_transmuters_before_casting() {
        let cast = Arc::new(Mutex::new(0));
        let counter = cast.clone();
        let recipe = Recipe::new(
            "count",
            move |s: String| {
                *counter.lock().unwrap() += 1;
                s
            },
            TextRefiner,
        );
        let alchemist = Alchemist::new(Echo::replying("hi"));

        let err = match alchemist.stream(&recipe, "x".into(), TransmuteOptions::new()).await {
            Ok(_) => panic!("stream should be rejected"),
            Err(e) => e,
        };
        assert!(err.is_streaming_unsupported());
        assert!(err.to_string().contains("does not support streaming"));
        assert_eq!(*cast.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn stream_yields_chunks_in_order() {
        let echo = Echo {
            reply: "one two three".into(),
            streams: true,
            ..Default::default()
        };
        let alchemist = Alchemist::new(echo);
        let chunks: Vec<String> = alchemist
            .stream(&greet(), "x".into(), TransmuteOptions::new())
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec!["one ", "two ", "three"]);
    }

    #[tokio::test]
    async fn cancelled_calls_fail_with_cancelled() {
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let echo = Arc::new(Echo::replying("hi"));
        let alchemist = Alchemist::from_shared(echo.clone());
        let err = alchemist
            .transmute(&greet(), "x".into(), TransmuteOptions::new().with_cancel(token))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(echo.calls.lock().unwrap().is_empty());
    }

    /// Never answers and never looks at the cancel token.
    struct Stalled;

    #[async_trait]
    impl Transmuter for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn transmute(
            &self,
            _parts: &[MaterialPart],
            _options: &TransmuteOptions,
        ) -> Result<TransmutationResult, AlchemyError> {
            std::future::pending().await
        }

        fn supports_streaming(&self) -> bool {
            true
        }

        async fn stream(
            &self,
            _parts: &[MaterialPart],
            _options: &TransmuteOptions,
        ) -> Result<TextStream, AlchemyError> {
            Ok(Box::pin(futures::stream::pending()))
        }
    }

    fn cancel_soon() -> tokio_util::sync::CancellationToken {
        let token = tokio_util::sync::CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });
        token
    }

    #[tokio::test]
    async fn cancellation_aborts_transmuters_that_ignore_the_token() {
        let alchemist = Alchemist::new(Stalled);
        let err = alchemist
            .transmute(&greet(), "x".into(), TransmuteOptions::new().with_cancel(cancel_soon()))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn cancellation_ends_streams_that_ignore_the_token() {
        let alchemist = Alchemist::new(Stalled);
        let mut stream = alchemist
            .stream(&greet(), "x".into(), TransmuteOptions::new().with_cancel(cancel_soon()))
            .await
            .unwrap();
        assert!(stream.next().await.unwrap().unwrap_err().is_cancelled());
        assert!(stream.next().await.is_none());
    }
}
