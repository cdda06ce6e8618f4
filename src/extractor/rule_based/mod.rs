//! Deterministic extraction from page structure.
//!
//! Page parsers are tried from the most to the least structured source; the
//! first one that produces a usable draft wins.

mod html_class;
mod ingredient_line;
mod json_ld;
mod microdata;
mod text;

pub(crate) use self::ingredient_line::parse_ingredient_line;
pub use self::html_class::HtmlClassParser;
pub use self::json_ld::JsonLdParser;
pub use self::microdata::MicroDataParser;
pub use self::text::TextHeuristicParser;

use super::page::document_language;
use super::ExtractionStrategy;
use crate::error::StrategyError;
use crate::model::{ExtractionMethod, ExtractionResult, RawContent};
use async_trait::async_trait;
use log::debug;
use scraper::Html;

pub struct ParsingContext {
    pub url: String,
    pub document: Html,
    /// Primary language subtag from `<html lang>`
    pub lang: Option<String>,
}

impl ParsingContext {
    pub fn new(url: &str, html: &str) -> Self {
        let document = Html::parse_document(html);
        let lang = document_language(&document);
        ParsingContext {
            url: url.to_string(),
            document,
            lang,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("invalid selector: {0}")]
    Selector(String),
}

/// One way of reading a recipe out of an HTML document
pub trait PageParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reported in the extraction metadata of drafts this parser produces
    fn confidence(&self) -> f32;

    fn parse(&self, context: &ParsingContext) -> Result<ExtractionResult, ParseError>;
}

pub struct RuleBasedStrategy {
    parsers: Vec<Box<dyn PageParser>>,
    text: TextHeuristicParser,
}

impl Default for RuleBasedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedStrategy {
    pub fn new() -> Self {
        RuleBasedStrategy {
            parsers: vec![
                Box::new(JsonLdParser),
                Box::new(MicroDataParser),
                Box::new(HtmlClassParser),
                Box::new(TextHeuristicParser),
            ],
            text: TextHeuristicParser,
        }
    }

    /// Run the parsers over `content` and return the first usable draft
    pub fn parse_content(&self, content: &RawContent) -> Option<ExtractionResult> {
        if !content.is_html() {
            debug!("Parsing plain-text body of {}", content.url);
            let result = self.text.parse_plain_text(&content.body).ok()?;
            return finish(result, self.text.name(), self.text.confidence(), None);
        }

        let context = ParsingContext::new(&content.url, &content.body);
        for parser in &self.parsers {
            match parser.parse(&context) {
                Ok(result) if result.is_usable() => {
                    debug!("Parser {} produced a usable draft", parser.name());
                    return finish(
                        result,
                        parser.name(),
                        parser.confidence(),
                        context.lang.clone(),
                    );
                }
                Ok(_) => debug!("Parser {} found an incomplete recipe", parser.name()),
                Err(e) => debug!("Parser {} failed: {}", parser.name(), e),
            }
        }

        None
    }
}

fn finish(
    mut result: ExtractionResult,
    parser: &str,
    confidence: f32,
    lang: Option<String>,
) -> Option<ExtractionResult> {
    if !result.is_usable() {
        return None;
    }
    let metadata = &mut result.extraction_metadata;
    metadata.method_used = ExtractionMethod::RuleBased;
    metadata.parser = Some(parser.to_string());
    metadata.confidence = Some(confidence);
    if metadata.language_detected.is_none() {
        metadata.language_detected = lang;
    }
    metadata.extracted_title = result.title.clone();
    Some(result)
}

#[async_trait]
impl ExtractionStrategy for RuleBasedStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::RuleBased
    }

    fn name(&self) -> &str {
        "rule_based"
    }

    async fn extract(
        &self,
        content: &RawContent,
        _source_url: &str,
    ) -> Result<ExtractionResult, StrategyError> {
        self.parse_content(content).ok_or(StrategyError::NoRecipe)
    }
}
