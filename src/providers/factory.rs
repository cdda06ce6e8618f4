use crate::config::AiConfig;
use crate::error::ProviderError;
use crate::providers::{AnthropicClient, ExtractionClient, OpenAiClient};
use log::{info, warn};
use std::sync::Arc;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create an extraction client from configuration
    pub fn create(config: &AiConfig) -> Result<Arc<dyn ExtractionClient>, ProviderError> {
        let provider_name = config.provider.trim().to_lowercase();
        let env_var = Self::api_key_env_var(&provider_name)
            .ok_or_else(|| ProviderError::UnknownProvider(provider_name.clone()))?;

        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(env_var).ok().filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| ProviderError::MissingCredentials(provider_name.clone()))?;

        match provider_name.as_str() {
            "openai" => Ok(Arc::new(OpenAiClient::new(config, api_key)?)),
            "anthropic" => Ok(Arc::new(AnthropicClient::new(config, api_key)?)),
            _ => Err(ProviderError::UnknownProvider(provider_name)),
        }
    }

    /// Like [`ProviderFactory::create`], but absent credentials disable the
    /// client instead of failing
    pub fn from_config(config: &AiConfig) -> Option<Arc<dyn ExtractionClient>> {
        match Self::create(config) {
            Ok(client) => {
                info!("Extraction service enabled: {}", client.provider_name());
                Some(client)
            }
            Err(ProviderError::MissingCredentials(provider)) => {
                info!(
                    "No credentials for '{}', using rule-based extraction only",
                    provider
                );
                None
            }
            Err(e) => {
                warn!("Extraction service disabled: {}", e);
                None
            }
        }
    }

    fn api_key_env_var(provider_name: &str) -> Option<&'static str> {
        match provider_name {
            "openai" => Some("OPENAI_API_KEY"),
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            _ => None,
        }
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "anthropic"]
    }
}
