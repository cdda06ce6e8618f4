use std::time::Duration;

use thiserror::Error;

/// Errors raised by a [`Fetcher`](crate::scraper::Fetcher) for a single attempt
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, DNS, TLS or body read failure
    #[error("network error while fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The request did not complete within the fetch timeout
    #[error("timed out after {after:?} while fetching {url}")]
    Timeout { url: String, after: Duration },

    /// The server answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

/// Coarse kind of a [`FetchError`], as exposed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    Timeout,
    HttpStatus,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network { .. } => FetchErrorKind::Network,
            FetchError::Timeout { .. } => FetchErrorKind::Timeout,
            FetchError::HttpStatus { .. } => FetchErrorKind::HttpStatus,
        }
    }
}

/// Errors raised by the [`Extractor`](crate::extractor::Extractor) once every strategy is exhausted
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No strategy found a title together with ingredients or instructions
    #[error("no_recipe_content: {0}")]
    NoRecipeContent(String),

    /// The extraction stage exceeded its time budget
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    /// The extraction service failed transiently and the fallback found nothing
    #[error("extraction service unavailable: {0}")]
    Upstream(String),
}

/// Errors raised by the [`Transformer`](crate::transformer::Transformer)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("recipe title is required")]
    MissingTitle,

    #[error("recipe has neither ingredients nor instructions")]
    EmptyRecipe,
}

/// Errors raised by a [`RecipeRepository`](crate::repository::RecipeRepository)
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to save recipe: {0}")]
    Write(String),

    #[error("save timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors raised by an [`ExtractionClient`](crate::providers::ExtractionClient)
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("extraction service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("extraction service reply had no content")]
    MissingContent,

    #[error("extraction service reply is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("no credentials configured for provider '{0}'")]
    MissingCredentials(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl ProviderError {
    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Request(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Failure of a single extraction strategy; the extractor falls through to the next one
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("strategy timed out after {0:?}")]
    Timeout(Duration),

    #[error("unusable reply: {0}")]
    InvalidReply(String),

    #[error("no recipe found")]
    NoRecipe,
}

impl StrategyError {
    /// Network failures, timeouts and HTTP 429/5xx from the extraction service
    pub fn is_transient(&self) -> bool {
        match self {
            StrategyError::Provider(err) => err.is_transient(),
            StrategyError::Timeout(_) => true,
            _ => false,
        }
    }
}

/// Any failure of one import attempt, tagged by where it happened
#[derive(Error, Debug)]
pub enum ImportError {
    /// The URL cannot be fetched at all (unparseable or not http/https)
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A shared HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// An import task ended without producing a result
    #[error("import task aborted: {0}")]
    Aborted(String),
}
