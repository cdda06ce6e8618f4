use crate::config::AiConfig;
use crate::error::ProviderError;
use crate::providers::{build_extraction_prompt, parse_json_reply, ExtractionClient};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    target_language: String,
}

impl AnthropicClient {
    /// Create a new Anthropic client from configuration and a resolved key
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = if config.model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };

        Ok(AnthropicClient {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            target_language: config.target_language.clone(),
        })
    }
}

#[async_trait]
impl ExtractionClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn request(
        &self,
        content: &str,
        schema: &Value,
        language_hint: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let system_prompt = build_extraction_prompt(schema, &self.target_language, language_hint);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "system": system_prompt,
                "messages": [
                    {
                        "role": "user",
                        "content": content
                    }
                ]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response_body: Value = response.json().await?;
        debug!("{:?}", response_body);

        let reply = response_body["content"][0]["text"]
            .as_str()
            .ok_or(ProviderError::MissingContent)?;

        parse_json_reply(reply)
    }
}
