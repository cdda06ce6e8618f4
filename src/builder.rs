use std::sync::Arc;

use crate::config::ImporterConfig;
use crate::error::ImportError;
use crate::extractor::Extractor;
use crate::importer::{RecipeImporter, RetryPolicy};
use crate::providers::ExtractionClient;
use crate::repository::{InMemoryRepository, RecipeRepository};
use crate::scraper::{build_fetcher, Fetcher};
use crate::transformer::Transformer;

/// How the extraction chain is assembled
#[derive(Default)]
enum ExtractionSetup {
    /// AI strategy when the configured provider has credentials
    #[default]
    FromConfig,
    /// AI strategy backed by the given client
    Client(Arc<dyn ExtractionClient>),
    /// No AI strategy at all
    RuleBasedOnly,
}

/// Builder for wiring a [`RecipeImporter`]
///
/// Anything not set explicitly comes from the configuration (defaults when
/// no configuration is given).
#[derive(Default)]
pub struct RecipeImporterBuilder {
    config: Option<ImporterConfig>,
    fetcher: Option<Arc<dyn Fetcher>>,
    extraction: ExtractionSetup,
    repository: Option<Arc<dyn RecipeRepository>>,
    retry_policy: Option<RetryPolicy>,
    max_concurrent: Option<usize>,
}

impl RecipeImporterBuilder {
    /// Use a loaded configuration instead of the defaults
    ///
    /// # Example
    /// ```
    /// use recipe_import::{ImporterConfig, RecipeImporter};
    ///
    /// let builder = RecipeImporter::builder()
    ///     .config(ImporterConfig::default());
    /// ```
    pub fn config(mut self, config: ImporterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the fetcher selected by `fetcher` configuration
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use the given extraction-service client for the AI strategy
    pub fn extraction_client(mut self, client: Arc<dyn ExtractionClient>) -> Self {
        self.extraction = ExtractionSetup::Client(client);
        self
    }

    /// Skip the AI strategy even when credentials are configured
    ///
    /// # Example
    /// ```
    /// use recipe_import::RecipeImporter;
    ///
    /// let importer = RecipeImporter::builder()
    ///     .rule_based_only()
    ///     .build()
    ///     .unwrap();
    /// assert!(!importer.extraction_status().ai_available);
    /// ```
    pub fn rule_based_only(mut self) -> Self {
        self.extraction = ExtractionSetup::RuleBasedOnly;
        self
    }

    /// Where imported recipes are stored; an in-memory repository otherwise
    pub fn repository(mut self, repository: Arc<dyn RecipeRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Override the retry settings from `import` configuration
    ///
    /// # Example
    /// ```
    /// use recipe_import::{RecipeImporter, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// let builder = RecipeImporter::builder().retry_policy(RetryPolicy {
    ///     max_retries: 5,
    ///     retry_delay: Duration::from_millis(500),
    ///     stage_timeout: Duration::from_secs(30),
    /// });
    /// ```
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Default number of simultaneous imports in a batch
    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = Some(max_concurrent);
        self
    }

    /// Build the importer
    ///
    /// # Errors
    /// Returns `ImportError::HttpClient` if the default fetcher's HTTP
    /// client cannot be created.
    pub fn build(self) -> Result<RecipeImporter, ImportError> {
        let config = self.config.unwrap_or_default();

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => build_fetcher(&config.fetcher)?,
        };

        let extractor = match self.extraction {
            ExtractionSetup::FromConfig => Extractor::from_config(&config.ai),
            ExtractionSetup::Client(client) => Extractor::from_client(Some(client), &config.ai),
            ExtractionSetup::RuleBasedOnly => Extractor::rule_based_only(),
        };

        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryRepository::new()));

        Ok(RecipeImporter {
            fetcher,
            extractor: Arc::new(extractor),
            transformer: Transformer::new(),
            repository,
            policy: self
                .retry_policy
                .unwrap_or_else(|| RetryPolicy::from(&config.import)),
            max_concurrent: self
                .max_concurrent
                .unwrap_or(config.import.max_concurrent)
                .max(1),
        })
    }
}
