use super::ingredient_line::parse_ingredient_line;
use super::{PageParser, ParseError, ParsingContext};
use crate::extractor::page::{document_title, element_text};
use crate::model::{ExtractedApplianceSetting, ExtractionMethod, ExtractionResult};
use crate::transformer::parse_minutes;
use log::debug;
use scraper::{Html, Selector};

/// Last resort: reads headings, lists and paragraphs in document order and
/// looks for ingredient and instruction sections by their heading words.
pub struct TextHeuristicParser;

const INGREDIENT_HEADINGS: &[&str] = &["ingredient", "ingrediente", "zutaten"];
const INSTRUCTION_HEADINGS: &[&str] = &[
    "instruction",
    "direction",
    "method",
    "steps",
    "preparation",
    "preparare",
    "zubereitung",
];
const SERVINGS_LABELS: &[&str] = &["serves", "servings", "yield", "portions"];
const OVEN_WORDS: &[&str] = &["oven", "bake", "roast"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Heading,
    Item,
    Paragraph,
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Ingredients,
    Instructions,
    Other,
}

impl TextHeuristicParser {
    /// Parse a body that is not HTML: one block per line
    pub fn parse_plain_text(&self, body: &str) -> Result<ExtractionResult, ParseError> {
        let blocks: Vec<Block> = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(classify_line)
            .collect();

        let title = blocks
            .iter()
            .find(|block| section_of(block).is_none() && label_value(&block.text).is_none())
            .map(|block| block.text.trim_end_matches(':').to_string());

        parse_blocks(&blocks, title)
    }
}

fn classify_line(line: &str) -> Block {
    let starts_with_number = {
        let digits = line.chars().take_while(char::is_ascii_digit).count();
        digits > 0 && matches!(line[digits..].chars().next(), Some('.' | ')'))
    };

    let kind = if line.starts_with(['-', '*', '•', '–']) || starts_with_number {
        BlockKind::Item
    } else if line.ends_with(':') {
        BlockKind::Heading
    } else {
        BlockKind::Paragraph
    };

    Block {
        kind,
        text: line.to_string(),
    }
}

fn html_blocks(document: &Html) -> Result<Vec<Block>, ParseError> {
    let selector = Selector::parse("h1, h2, h3, h4, h5, h6, li, p")
        .map_err(|e| ParseError::Selector(e.to_string()))?;

    let blocks = document
        .select(&selector)
        .filter_map(|element| {
            let name = element.value().name();
            let kind = match name {
                "li" => BlockKind::Item,
                "p" => BlockKind::Paragraph,
                _ => BlockKind::Heading,
            };
            if kind == BlockKind::Paragraph {
                let in_list_item = element.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| el.name() == "li")
                });
                if in_list_item {
                    return None;
                }
            }

            let text = element_text(element);
            (!text.is_empty()).then_some(Block { kind, text })
        })
        .collect();

    Ok(blocks)
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|word| text.contains(word))
}

/// Section a block opens, if it reads like a section heading
fn section_of(block: &Block) -> Option<Section> {
    let text = block.text.trim_end_matches(':').to_lowercase();
    let max_words = match block.kind {
        BlockKind::Heading => 6,
        _ => 3,
    };
    if text.split_whitespace().count() > max_words {
        return None;
    }

    if contains_any(&text, INGREDIENT_HEADINGS) {
        Some(Section::Ingredients)
    } else if contains_any(&text, INSTRUCTION_HEADINGS) {
        Some(Section::Instructions)
    } else if block.kind == BlockKind::Heading {
        Some(Section::Other)
    } else {
        None
    }
}

enum Label {
    Prep(String),
    Cook(String),
    Servings(String),
}

/// "Prep time: 10 min", "Cook: 1 hour", "Serves 4"
fn label_value(text: &str) -> Option<Label> {
    if text.chars().count() > 60 {
        return None;
    }
    let lower = text.to_lowercase();
    let after_colon = text
        .split_once(':')
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty());

    if lower.starts_with("prep") {
        after_colon.map(Label::Prep)
    } else if lower.starts_with("cook time")
        || lower.starts_with("cooking time")
        || lower.starts_with("cook:")
    {
        after_colon.map(Label::Cook)
    } else if SERVINGS_LABELS.iter().any(|label| lower.starts_with(label)) {
        Some(Label::Servings(after_colon.unwrap_or_else(|| text.to_string())))
    } else {
        None
    }
}

/// Degrees Celsius from "350°F", "180 °C" or "200 degrees C"
fn temperature_celsius(lower: &str) -> Option<u32> {
    let mut rest = lower;
    while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
        let digits: String = rest[start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        let after = rest[start + digits.len()..].trim_start();
        let unit = after
            .strip_prefix('°')
            .or_else(|| after.strip_prefix('º'))
            .or_else(|| after.strip_prefix("degrees"))
            .or_else(|| after.strip_prefix("degree"))
            .map(str::trim_start)
            .and_then(|unit| unit.chars().next());

        if let (Ok(value), Some(unit)) = (digits.parse::<f64>(), unit) {
            match unit {
                'f' => return Some(((value - 32.0) * 5.0 / 9.0).round() as u32),
                'c' => return Some(value.round() as u32),
                _ => {}
            }
        }
        rest = &rest[start + digits.len()..];
    }
    None
}

/// Oven setting from a step like "Bake at 350°F for 25 minutes"
fn oven_setting(step: &str) -> Option<ExtractedApplianceSetting> {
    let lower = step.to_lowercase();
    if !contains_any(&lower, OVEN_WORDS) {
        return None;
    }
    let temperature = temperature_celsius(&lower)?;

    let duration_minutes = lower.find(" for ").and_then(|index| {
        let clause = &lower[index + 5..];
        let end = clause.find([',', '.', ';']).unwrap_or(clause.len());
        parse_minutes(&clause[..end])
    });

    Some(ExtractedApplianceSetting {
        appliance_type: "oven".to_string(),
        temperature_celsius: Some(temperature),
        heat_level: None,
        duration_minutes,
        utensils: Vec::new(),
        notes: None,
    })
}

fn parse_blocks(blocks: &[Block], title: Option<String>) -> Result<ExtractionResult, ParseError> {
    let mut result = ExtractionResult::empty(ExtractionMethod::RuleBased);
    result.title = title;

    let mut section = None;
    for block in blocks {
        if let Some(opened) = section_of(block) {
            section = Some(opened);
            continue;
        }

        match label_value(&block.text) {
            Some(Label::Prep(value)) => {
                result.prep_time.get_or_insert(value);
                continue;
            }
            Some(Label::Cook(value)) => {
                result.cook_time.get_or_insert(value);
                continue;
            }
            Some(Label::Servings(value)) => {
                result.servings.get_or_insert(value);
                continue;
            }
            None => {}
        }

        match section {
            Some(Section::Ingredients) if block.text.chars().count() < 200 => {
                if let Some(ingredient) = parse_ingredient_line(&block.text) {
                    result.ingredients.push(ingredient);
                }
            }
            Some(Section::Instructions) => {
                result.instructions.push(block.text.clone());
            }
            _ => {}
        }
    }

    if result.ingredients.is_empty() && result.instructions.is_empty() {
        return Err(ParseError::NotFound("no ingredient or instruction sections"));
    }

    if let Some(setting) = result.instructions.iter().find_map(|step| oven_setting(step)) {
        result.appliance_settings.push(setting);
    }

    debug!(
        "Text heuristics: {} ingredients, {} instructions",
        result.ingredients.len(),
        result.instructions.len()
    );
    Ok(result)
}

impl PageParser for TextHeuristicParser {
    fn name(&self) -> &'static str {
        "text"
    }

    fn confidence(&self) -> f32 {
        0.4
    }

    fn parse(&self, context: &ParsingContext) -> Result<ExtractionResult, ParseError> {
        let document = &context.document;
        let h1 = Selector::parse("h1").map_err(|e| ParseError::Selector(e.to_string()))?;
        let title = document
            .select(&h1)
            .map(element_text)
            .find(|text| !text.is_empty())
            .or_else(|| document_title(document));

        parse_blocks(&html_blocks(document)?, title)
    }
}
