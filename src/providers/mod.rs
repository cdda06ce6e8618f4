mod anthropic;
mod factory;
mod open_ai;
mod prompt;

pub use anthropic::AnthropicClient;
pub use factory::ProviderFactory;
pub use open_ai::OpenAiClient;
pub use prompt::{build_extraction_prompt, extraction_schema, EXTRACTION_PROMPT};

use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;

/// Narrow interface to a schema-constrained extraction service
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Send page text and receive a JSON object shaped by `schema`
    async fn request(
        &self,
        content: &str,
        schema: &Value,
        language_hint: Option<&str>,
    ) -> Result<Value, ProviderError>;
}

/// Parse a model reply as JSON, tolerating markdown code fences around it
pub(crate) fn parse_json_reply(text: &str) -> Result<Value, ProviderError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);

    Ok(serde_json::from_str(unfenced.trim())?)
}
