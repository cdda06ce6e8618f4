use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Top-level importer configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ImporterConfig {
    /// Retry and concurrency settings for the import pipeline
    #[serde(default)]
    pub import: ImportConfig,
    /// Page fetching settings
    #[serde(default)]
    pub fetcher: FetcherConfig,
    /// Extraction-service settings; without credentials the AI strategy is disabled
    #[serde(default)]
    pub ai: AiConfig,
}

/// Retry and concurrency settings
#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Maximum attempts for a single URL
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds (grows linearly per attempt)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Time budget for each pipeline stage in seconds
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
    /// Default number of simultaneous imports in a batch
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            stage_timeout_secs: default_stage_timeout_secs(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Page fetching settings
#[derive(Debug, Deserialize, Clone)]
pub struct FetcherConfig {
    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    /// User agent sent with plain HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Base URL of a page-rendering service for JavaScript-heavy pages
    pub page_scriber_url: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
            page_scriber_url: None,
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Extraction-service settings
#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Provider name ("openai" or "anthropic")
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier; an empty value picks the provider default
    #[serde(default)]
    pub model: String,
    /// API key (can also be set via OPENAI_API_KEY / ANTHROPIC_API_KEY)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
    /// Temperature for generation (0.0-1.0)
    #[serde(default)]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Time budget for one extraction-service call in seconds
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
    /// Language the extracted recipe is translated into
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Page text sent to the service is truncated to this many characters
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: String::new(),
            api_key: None,
            base_url: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_ai_timeout_secs(),
            target_language: default_target_language(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Default value functions
fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_stage_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    3
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_ai_timeout_secs() -> u64 {
    20
}

fn default_target_language() -> String {
    "English".to_string()
}

fn default_max_content_chars() -> usize {
    12_000
}

impl ImporterConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_IMPORT__ prefix
    /// 2. recipe-import.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_IMPORT__AI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// See [`ImporterConfig::load`]
pub fn load_config() -> Result<ImporterConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe-import").required(false))
        // Use double underscore for nested: RECIPE_IMPORT__IMPORT__MAX_RETRIES
        .add_source(
            Environment::with_prefix("RECIPE_IMPORT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
