//! Turns fetched page content into an unvalidated recipe draft.
//!
//! Strategies run in order, AI first when credentials are configured, and
//! the first usable draft wins. Nothing is retried here; the importer decides
//! whether a failed extraction is worth another attempt.

mod ai;
mod page;
pub mod rule_based;

pub use self::ai::AiStrategy;
pub use self::rule_based::RuleBasedStrategy;

use crate::config::AiConfig;
use crate::error::{ExtractionError, StrategyError};
use crate::model::{ExtractionMethod, ExtractionResult, ExtractionStatus, RawContent};
use crate::providers::{ExtractionClient, ProviderFactory};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    /// Short name used in logs
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    async fn extract(
        &self,
        content: &RawContent,
        source_url: &str,
    ) -> Result<ExtractionResult, StrategyError>;
}

pub struct Extractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Extractor {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Extractor { strategies }
    }

    /// AI strategy when credentials resolve, rule-based fallback always
    pub fn from_config(config: &AiConfig) -> Self {
        Self::from_client(ProviderFactory::from_config(config), config)
    }

    pub fn from_client(client: Option<Arc<dyn ExtractionClient>>, config: &AiConfig) -> Self {
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();
        if let Some(client) = client {
            strategies.push(Box::new(AiStrategy::new(client, config)));
        }
        strategies.push(Box::new(RuleBasedStrategy::new()));
        Extractor { strategies }
    }

    pub fn rule_based_only() -> Self {
        Extractor {
            strategies: vec![Box::new(RuleBasedStrategy::new())],
        }
    }

    pub fn status(&self) -> ExtractionStatus {
        let available = |method| {
            self.strategies
                .iter()
                .any(|s| s.method() == method && s.is_available())
        };
        ExtractionStatus {
            ai_available: available(ExtractionMethod::Ai),
            fallback_available: available(ExtractionMethod::RuleBased),
        }
    }

    pub async fn extract(
        &self,
        content: &RawContent,
        source_url: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        self.run_chain(content, source_url, None).await
    }

    /// Like [`Extractor::extract`], but every strategy gets at most `budget`.
    ///
    /// A strategy that runs out of time counts as a transient failure and
    /// the next one still gets its full turn, so a stalled extraction
    /// service never starves the rule-based fallback.
    pub async fn extract_within(
        &self,
        content: &RawContent,
        source_url: &str,
        budget: Duration,
    ) -> Result<ExtractionResult, ExtractionError> {
        self.run_chain(content, source_url, Some(budget)).await
    }

    async fn run_chain(
        &self,
        content: &RawContent,
        source_url: &str,
        budget: Option<Duration>,
    ) -> Result<ExtractionResult, ExtractionError> {
        let mut failures = Vec::new();
        let mut upstream_failed = false;
        // a timeout is only reported when no strategy failed any other way
        let mut timed_out: Option<Duration> = None;
        let mut only_timeouts = true;

        for strategy in self.strategies.iter().filter(|s| s.is_available()) {
            debug!("Trying {} extraction for {}", strategy.name(), source_url);
            let outcome = match budget {
                Some(budget) => {
                    tokio::time::timeout(budget, strategy.extract(content, source_url))
                        .await
                        .unwrap_or_else(|_| Err(StrategyError::Timeout(budget)))
                }
                None => strategy.extract(content, source_url).await,
            };
            match outcome {
                Ok(mut result) if result.is_usable() => {
                    result.extraction_metadata.method_used = strategy.method();
                    info!(
                        "Extracted '{}' from {} using {}",
                        result.title.as_deref().unwrap_or_default(),
                        source_url,
                        strategy.name()
                    );
                    return Ok(result);
                }
                Ok(_) => {
                    warn!(
                        "{} extraction returned an incomplete recipe for {}, falling back",
                        strategy.name(),
                        source_url
                    );
                    only_timeouts = false;
                    failures.push(format!("{}: incomplete recipe", strategy.name()));
                }
                Err(e) => {
                    warn!(
                        "{} extraction failed for {}: {}, falling back",
                        strategy.name(),
                        source_url,
                        e
                    );
                    upstream_failed |= e.is_transient();
                    match &e {
                        StrategyError::Timeout(after) => timed_out = Some(*after),
                        _ => only_timeouts = false,
                    }
                    failures.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        let summary = if failures.is_empty() {
            "no extraction strategy available".to_string()
        } else {
            failures.join("; ")
        };

        if let (true, Some(after)) = (only_timeouts, timed_out) {
            Err(ExtractionError::Timeout(after))
        } else if upstream_failed {
            Err(ExtractionError::Upstream(summary))
        } else {
            Err(ExtractionError::NoRecipeContent(summary))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        method: ExtractionMethod,
        outcome: fn() -> Result<ExtractionResult, StrategyError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn boxed(
            method: ExtractionMethod,
            outcome: fn() -> Result<ExtractionResult, StrategyError>,
        ) -> Box<dyn ExtractionStrategy> {
            Box::new(Scripted {
                method,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ExtractionStrategy for Scripted {
        fn method(&self) -> ExtractionMethod {
            self.method
        }

        fn name(&self) -> &str {
            self.method.as_str()
        }

        async fn extract(
            &self,
            _content: &RawContent,
            _source_url: &str,
        ) -> Result<ExtractionResult, StrategyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn soup() -> Result<ExtractionResult, StrategyError> {
        let mut result = ExtractionResult::empty(ExtractionMethod::Ai);
        result.title = Some("Soup".to_string());
        result.instructions.push("Boil water".to_string());
        Ok(result)
    }

    fn service_down() -> Result<ExtractionResult, StrategyError> {
        Err(ProviderError::Status {
            status: 503,
            body: String::new(),
        }
        .into())
    }

    fn no_recipe() -> Result<ExtractionResult, StrategyError> {
        Err(StrategyError::NoRecipe)
    }

    fn page() -> RawContent {
        RawContent::new("https://example.com", "<html></html>", "text/html")
    }

    #[tokio::test]
    async fn test_falls_back_and_records_method() {
        let extractor = Extractor::new(vec![
            Scripted::boxed(ExtractionMethod::Ai, service_down),
            Scripted::boxed(ExtractionMethod::RuleBased, soup),
        ]);

        let result = extractor.extract(&page(), "https://example.com").await.unwrap();
        assert_eq!(result.extraction_metadata.method_used, ExtractionMethod::RuleBased);
    }

    #[tokio::test]
    async fn test_transient_ai_failure_surfaces_as_upstream() {
        let extractor = Extractor::new(vec![
            Scripted::boxed(ExtractionMethod::Ai, service_down),
            Scripted::boxed(ExtractionMethod::RuleBased, no_recipe),
        ]);

        let err = extractor.extract(&page(), "https://example.com").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let extractor = Extractor::new(vec![
            Scripted::boxed(ExtractionMethod::Ai, no_recipe),
            Scripted::boxed(ExtractionMethod::RuleBased, no_recipe),
        ]);

        let err = extractor.extract(&page(), "https://example.com").await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoRecipeContent(_)));
        assert!(err.to_string().starts_with("no_recipe_content"));
    }

    #[tokio::test]
    async fn test_first_usable_result_stops_the_chain() {
        let fallback = Scripted {
            method: ExtractionMethod::RuleBased,
            outcome: soup,
            calls: AtomicUsize::new(0),
        };
        let fallback = Arc::new(fallback);

        struct Shared(Arc<Scripted>);

        #[async_trait]
        impl ExtractionStrategy for Shared {
            fn method(&self) -> ExtractionMethod {
                self.0.method()
            }
            fn name(&self) -> &str {
                self.0.name()
            }
            async fn extract(
                &self,
                content: &RawContent,
                source_url: &str,
            ) -> Result<ExtractionResult, StrategyError> {
                self.0.extract(content, source_url).await
            }
        }

        let extractor = Extractor::new(vec![
            Scripted::boxed(ExtractionMethod::Ai, soup),
            Box::new(Shared(fallback.clone())),
        ]);

        let result = extractor.extract(&page(), "https://example.com").await.unwrap();
        assert_eq!(result.extraction_metadata.method_used, ExtractionMethod::Ai);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    struct Stalled;

    #[async_trait]
    impl ExtractionStrategy for Stalled {
        fn method(&self) -> ExtractionMethod {
            ExtractionMethod::Ai
        }

        fn name(&self) -> &str {
            "stalled"
        }

        async fn extract(
            &self,
            _content: &RawContent,
            _source_url: &str,
        ) -> Result<ExtractionResult, StrategyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            soup()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_strategy_leaves_time_for_fallback() {
        let extractor = Extractor::new(vec![
            Box::new(Stalled),
            Scripted::boxed(ExtractionMethod::RuleBased, soup),
        ]);

        let started = tokio::time::Instant::now();
        let result = extractor
            .extract_within(&page(), "https://example.com", Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(result.extraction_metadata.method_used, ExtractionMethod::RuleBased);
        assert!(started.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausted_by_every_strategy() {
        let extractor = Extractor::new(vec![Box::new(Stalled)]);

        let err = extractor
            .extract_within(&page(), "https://example.com", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(after) if after == Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_nothing_found_is_upstream() {
        let extractor = Extractor::new(vec![
            Box::new(Stalled),
            Scripted::boxed(ExtractionMethod::RuleBased, no_recipe),
        ]);

        let err = extractor
            .extract_within(&page(), "https://example.com", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Upstream(_)));
    }

    #[test]
    fn test_status() {
        let rule_based = Extractor::rule_based_only().status();
        assert!(!rule_based.ai_available);
        assert!(rule_based.fallback_available);

        let with_ai = Extractor::new(vec![
            Scripted::boxed(ExtractionMethod::Ai, soup),
            Box::new(RuleBasedStrategy::new()),
        ]);
        assert!(with_ai.status().ai_available);
    }

    #[tokio::test]
    async fn test_without_credentials_uses_rule_based() {
        let extractor = Extractor::from_client(None, &AiConfig::default());
        assert!(!extractor.status().ai_available);

        let page = RawContent::new(
            "https://example.com/garlic-pasta",
            r#"<html><head><script type="application/ld+json">
            {"@type": "Recipe", "name": "Garlic Pasta",
             "recipeIngredient": ["200 g spaghetti", "3 cloves garlic"],
             "recipeInstructions": [{"@type": "HowToStep", "text": "Cook the pasta."}]}
            </script></head><body></body></html>"#,
            "text/html",
        );
        let result = extractor.extract(&page, &page.url).await.unwrap();
        assert_eq!(result.extraction_metadata.method_used, ExtractionMethod::RuleBased);
        assert_eq!(result.extraction_metadata.parser.as_deref(), Some("json_ld"));
    }
}
