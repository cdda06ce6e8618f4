//! Single-URL import with retries.
//!
//! Each attempt walks Fetching → Extracting → Transforming → Persisting.
//! A failed stage is classified as transient or terminal and the
//! [`RetryPolicy`] decides whether another attempt follows.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use reqwest::Url;

use crate::builder::RecipeImporterBuilder;
use crate::config::{ImportConfig, ImporterConfig};
use crate::error::{ExtractionError, FetchError, ImportError, PersistError};
use crate::extractor::Extractor;
use crate::model::{ExtractionMetadata, ExtractionStatus, ImportMetadata, ImportResult, ImportStatus};
use crate::repository::RecipeRepository;
use crate::scraper::Fetcher;
use crate::transformer::Transformer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Another attempt may succeed
    Transient,
    /// Retrying cannot change the outcome
    Terminal,
}

/// Only the importer classifies failures; everything below it just reports them
pub fn classify(err: &ImportError) -> FailureClass {
    match err {
        ImportError::Fetch(_) | ImportError::Persist(_) => FailureClass::Transient,
        ImportError::Extraction(ExtractionError::Timeout(_) | ExtractionError::Upstream(_)) => {
            FailureClass::Transient
        }
        ImportError::Extraction(ExtractionError::NoRecipeContent(_))
        | ImportError::Validation(_)
        | ImportError::InvalidUrl { .. }
        | ImportError::Config(_)
        | ImportError::HttpClient(_)
        | ImportError::Aborted(_) => FailureClass::Terminal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per URL, including the first
    pub max_retries: u32,
    /// Delay before the second attempt; later attempts wait proportionally longer
    pub retry_delay: Duration,
    /// Budget for each stage of an attempt
    pub stage_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for RetryPolicy {
    fn from(config: &ImportConfig) -> Self {
        RetryPolicy {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            stage_timeout: Duration::from_secs(config.stage_timeout_secs),
        }
    }
}

impl RetryPolicy {
    /// What to do after `attempt` (1-based) failed with `class`
    pub fn decide(&self, attempt: u32, class: FailureClass) -> RetryDecision {
        if class == FailureClass::Terminal || attempt >= self.max_retries.max(1) {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry(self.retry_delay * attempt)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Fetching,
    Extracting,
    Transforming,
    Persisting,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Fetching => "fetching",
            ImportStage::Extracting => "extracting",
            ImportStage::Transforming => "transforming",
            ImportStage::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Reject URLs that can never be fetched before spending an attempt on them
pub fn validate_url(url: &str) -> Result<Url, ImportError> {
    let invalid = |reason: String| ImportError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed)
}

/// Runs the import pipeline; cheap to clone, all collaborators are shared
#[derive(Clone)]
pub struct RecipeImporter {
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) extractor: Arc<Extractor>,
    pub(crate) transformer: Transformer,
    pub(crate) repository: Arc<dyn RecipeRepository>,
    pub(crate) policy: RetryPolicy,
    pub(crate) max_concurrent: usize,
}

impl RecipeImporter {
    /// Creates a new builder for wiring an importer
    ///
    /// # Example
    /// ```
    /// use recipe_import::RecipeImporter;
    ///
    /// let builder = RecipeImporter::builder();
    /// ```
    pub fn builder() -> RecipeImporterBuilder {
        RecipeImporterBuilder::default()
    }

    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Extractor,
        repository: Arc<dyn RecipeRepository>,
        policy: RetryPolicy,
    ) -> Self {
        RecipeImporter {
            fetcher,
            extractor: Arc::new(extractor),
            transformer: Transformer::new(),
            repository,
            policy,
            max_concurrent: ImportConfig::default().max_concurrent,
        }
    }

    /// Build the HTTP and extraction clients once from configuration
    pub fn from_config(
        config: &ImporterConfig,
        repository: Arc<dyn RecipeRepository>,
    ) -> Result<Self, ImportError> {
        Self::builder()
            .config(config.clone())
            .repository(repository)
            .build()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn extraction_status(&self) -> ExtractionStatus {
        self.extractor.status()
    }

    /// Whether `url` already produced a stored recipe
    pub async fn import_status(&self, url: &str) -> Result<ImportStatus, ImportError> {
        let status = match self.repository.find_by_source_url(url).await? {
            Some((recipe_id, recipe)) => ImportStatus::Exists {
                recipe_id,
                title: recipe.title,
            },
            None => ImportStatus::NotImported {
                url: url.to_string(),
            },
        };
        Ok(status)
    }

    pub async fn import_from_url(&self, url: &str, metadata: Option<&ImportMetadata>) -> ImportResult {
        self.import_from_url_with_policy(url, metadata, &self.policy)
            .await
    }

    pub async fn import_from_url_with_policy(
        &self,
        url: &str,
        metadata: Option<&ImportMetadata>,
        policy: &RetryPolicy,
    ) -> ImportResult {
        if let Err(err) = validate_url(url) {
            warn!("Rejected {}: {}", url, err);
            return ImportResult::failed(url, err.to_string(), 1, None);
        }

        let overrides = metadata.cloned().unwrap_or_default();
        let max_attempts = policy.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!("Importing {} (attempt {}/{})", url, attempt, max_attempts);

            let mut extraction_metadata = None;
            let outcome = self
                .attempt(url, &overrides, policy.stage_timeout, &mut extraction_metadata)
                .await;

            match outcome {
                Ok(recipe_id) => {
                    info!("Imported {} as {} after {} attempt(s)", url, recipe_id, attempt);
                    return ImportResult::succeeded(url, recipe_id, attempt, extraction_metadata);
                }
                Err(err) => match policy.decide(attempt, classify(&err)) {
                    RetryDecision::Retry(delay) => {
                        warn!(
                            "Attempt {} for {} failed: {}; retrying in {:?}",
                            attempt, url, err, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::GiveUp => {
                        error!("Import of {} failed after {} attempt(s): {}", url, attempt, err);
                        return ImportResult::failed(
                            url,
                            err.to_string(),
                            attempt,
                            extraction_metadata,
                        );
                    }
                },
            }
        }
    }

    /// One pass through every stage; persisting is last, so a failure
    /// anywhere leaves nothing behind
    async fn attempt(
        &self,
        url: &str,
        overrides: &ImportMetadata,
        stage_timeout: Duration,
        extraction_metadata: &mut Option<ExtractionMetadata>,
    ) -> Result<String, ImportError> {
        let content = run_stage(
            ImportStage::Fetching,
            url,
            stage_timeout,
            self.fetcher.fetch(url),
            || FetchError::Timeout {
                url: url.to_string(),
                after: stage_timeout,
            },
        )
        .await?;

        // the stage budget applies per strategy, not to the whole chain
        debug!("{} {}", ImportStage::Extracting, url);
        let extracted = self
            .extractor
            .extract_within(&content, url, stage_timeout)
            .await?;
        *extraction_metadata = Some(extracted.extraction_metadata.clone());

        debug!("{} {}", ImportStage::Transforming, url);
        let recipe = self.transformer.transform(&extracted, url, overrides)?;

        run_stage(
            ImportStage::Persisting,
            url,
            stage_timeout,
            self.repository.save(&recipe),
            || PersistError::Timeout(stage_timeout),
        )
        .await
    }
}

/// Await one stage under `timeout`, turning an overrun into `on_timeout`
async fn run_stage<T, E, F, C, O>(
    stage: ImportStage,
    url: &str,
    timeout: Duration,
    future: F,
    on_timeout: C,
) -> Result<T, ImportError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ImportError>,
    C: FnOnce() -> O,
    O: Into<ImportError>,
{
    debug!("{} {}", stage, url);
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            warn!("Stage {} timed out after {:?} for {}", stage, timeout, url);
            Err(on_timeout().into())
        }
    }
}
