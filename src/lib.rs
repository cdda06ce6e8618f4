//! Import recipes from web pages.
//!
//! A URL is fetched, a recipe draft is extracted from the page (AI extraction
//! when credentials are configured, rule-based parsing otherwise), normalized
//! into a [`Recipe`] and stored through a [`RecipeRepository`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use recipe_import::{load_config, InMemoryRepository, RecipeImporter};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config()?;
//! let importer = RecipeImporter::from_config(&config, Arc::new(InMemoryRepository::new()))?;
//!
//! let result = importer
//!     .import_from_url("https://example.com/garlic-pasta", None)
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod builder;
pub mod config;
pub mod error;
pub mod extractor;
pub mod importer;
pub mod model;
pub mod providers;
pub mod repository;
pub mod scraper;
pub mod transformer;

pub use builder::RecipeImporterBuilder;
pub use config::{load_config, AiConfig, FetcherConfig, ImportConfig, ImporterConfig};
pub use error::{
    ExtractionError, FetchError, ImportError, PersistError, ProviderError, StrategyError,
    ValidationError,
};
pub use extractor::{ExtractionStrategy, Extractor};
pub use importer::{classify, FailureClass, RecipeImporter, RetryDecision, RetryPolicy};
pub use model::{
    BatchImportResult, ExtractionMetadata, ExtractionMethod, ExtractionResult, ExtractionStatus,
    ImportMetadata, ImportResult, ImportStatus, RawContent, Recipe,
};
pub use repository::{InMemoryRepository, RecipeRepository};
pub use crate::scraper::Fetcher;
pub use transformer::Transformer;
