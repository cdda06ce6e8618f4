use super::page::{document_language, truncate_text, visible_text};
use super::rule_based::parse_ingredient_line;
use super::ExtractionStrategy;
use crate::config::AiConfig;
use crate::error::StrategyError;
use crate::model::{
    ExtractedApplianceSetting, ExtractedIngredient, ExtractionMethod, ExtractionResult, RawContent,
};
use crate::providers::{extraction_schema, ExtractionClient};
use async_trait::async_trait;
use log::{debug, info};
use scraper::Html;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Extraction through a schema-constrained language-model service
pub struct AiStrategy {
    client: Arc<dyn ExtractionClient>,
    schema: Value,
    timeout: Duration,
    max_content_chars: usize,
}

impl AiStrategy {
    pub fn new(client: Arc<dyn ExtractionClient>, config: &AiConfig) -> Self {
        AiStrategy {
            client,
            schema: extraction_schema(),
            timeout: config.timeout(),
            max_content_chars: config.max_content_chars,
        }
    }
}

/// Text sent to the service and the page's declared language
fn prepare_content(content: &RawContent, max_chars: usize) -> (String, Option<String>) {
    if content.is_html() {
        let document = Html::parse_document(&content.body);
        let text = visible_text(&document);
        (
            truncate_text(&text, max_chars).to_string(),
            document_language(&document),
        )
    } else {
        (truncate_text(content.body.trim(), max_chars).to_string(), None)
    }
}

/// Strings and numbers both come back from models for free-text fields
fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(text_field).collect())
        .unwrap_or_default()
}

fn ingredient(value: &Value) -> Option<ExtractedIngredient> {
    match value {
        Value::String(line) => parse_ingredient_line(line),
        Value::Object(_) => Some(ExtractedIngredient {
            name: text_field(&value["name"])?,
            amount: text_field(&value["amount"]).unwrap_or_default(),
            unit: text_field(&value["unit"]),
        }),
        _ => None,
    }
}

fn instruction(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => text_field(&value["text"]).or_else(|| text_field(&value["step"])),
        other => text_field(other),
    }
}

/// Read a reply into a draft, skipping malformed entries instead of
/// rejecting the whole reply
pub(crate) fn result_from_reply(reply: &Value, provider: &str) -> ExtractionResult {
    let mut result = ExtractionResult::empty(ExtractionMethod::Ai);

    result.title = text_field(&reply["title"]);
    result.description = text_field(&reply["description"]);
    result.ingredients = reply["ingredients"]
        .as_array()
        .map(|items| items.iter().filter_map(ingredient).collect())
        .unwrap_or_default();
    result.instructions = reply["instructions"]
        .as_array()
        .map(|items| items.iter().filter_map(instruction).collect())
        .unwrap_or_default();
    result.prep_time = text_field(&reply["prep_time"]);
    result.cook_time = text_field(&reply["cook_time"]);
    result.servings = text_field(&reply["servings"]);
    result.difficulty = text_field(&reply["difficulty"]);
    result.tags = string_list(&reply["tags"]);
    result.meal_times = string_list(&reply["meal_times"]);
    result.images = string_list(&reply["images"]);
    result.appliance_settings = reply["appliance_settings"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    serde_json::from_value::<ExtractedApplianceSetting>(item.clone()).ok()
                })
                .collect()
        })
        .unwrap_or_default();

    let metadata = &mut result.extraction_metadata;
    metadata.parser = Some(provider.to_string());
    metadata.language_detected = text_field(&reply["language_detected"]).map(|l| l.to_lowercase());
    metadata.extracted_title = result.title.clone();
    result
}

#[async_trait]
impl ExtractionStrategy for AiStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Ai
    }

    fn name(&self) -> &str {
        self.client.provider_name()
    }

    async fn extract(
        &self,
        content: &RawContent,
        source_url: &str,
    ) -> Result<ExtractionResult, StrategyError> {
        let (text, language_hint) = prepare_content(content, self.max_content_chars);
        if text.trim().is_empty() {
            return Err(StrategyError::NoRecipe);
        }

        info!(
            "Requesting extraction of {} from {} ({} chars)",
            source_url,
            self.client.provider_name(),
            text.chars().count()
        );

        let request = self
            .client
            .request(&text, &self.schema, language_hint.as_deref());
        let reply = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| StrategyError::Timeout(self.timeout))??;
        debug!("Extraction reply: {}", reply);

        let mut result = result_from_reply(&reply, self.client.provider_name());
        if !result.is_usable() {
            return Err(StrategyError::InvalidReply(
                "reply lacks a title or recipe content".to_string(),
            ));
        }
        if result.extraction_metadata.language_detected.is_none() {
            result.extraction_metadata.language_detected = language_hint;
        }
        Ok(result)
    }
}
