//! Normalization and validation of extraction drafts into canonical recipes.
//!
//! The transformer is pure: no clock, no I/O, ordered collections only, so
//! identical inputs always produce identical recipes.

pub mod time;
pub mod units;

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde_json::Value;

use crate::error::ValidationError;
use crate::model::{
    ApplianceSetting, ApplianceType, Difficulty, ExtractedApplianceSetting, ExtractedIngredient,
    ExtractionResult, ImportMetadata, Ingredient, MealTime, Recipe, Source,
};

pub use self::time::{parse_minutes, parse_servings};
pub use self::units::{canonical_unit, normalize_unit};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_INGREDIENT_NAME_LEN: usize = 100;
const MAX_AMOUNT_LEN: usize = 50;
const MIN_INSTRUCTION_LEN: usize = 5;
const MAX_TAGS: usize = 20;
const MIN_TAG_LEN: usize = 2;
const MAX_TAG_LEN: usize = 50;
const DEFAULT_AMOUNT: &str = "1";
const DEFAULT_SOURCE_TYPE: &str = "website";

#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer;

impl Transformer {
    pub fn new() -> Self {
        Transformer
    }

    /// Normalize an extraction draft into a canonical [`Recipe`].
    ///
    /// Fails closed when the result would lack a title or have neither
    /// ingredients nor instructions.
    pub fn transform(
        &self,
        extraction: &ExtractionResult,
        source_url: &str,
        overrides: &ImportMetadata,
    ) -> Result<Recipe, ValidationError> {
        let title = extraction
            .title
            .as_deref()
            .map(clean_title)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingTitle)?;

        let ingredients = transform_ingredients(&extraction.ingredients);
        let instructions = transform_instructions(&extraction.instructions);
        if ingredients.is_empty() && instructions.is_empty() {
            return Err(ValidationError::EmptyRecipe);
        }

        let recipe = Recipe {
            title,
            description: extraction.description.as_deref().and_then(clean_description),
            ingredients,
            instructions,
            prep_time: extraction.prep_time.as_deref().and_then(parse_minutes),
            cook_time: extraction.cook_time.as_deref().and_then(parse_minutes),
            servings: extraction.servings.as_deref().and_then(parse_servings),
            difficulty: extraction.difficulty.as_deref().and_then(normalize_difficulty),
            tags: merge_tags(&extraction.tags, &overrides.additional_tags),
            meal_times: merge_meal_times(&extraction.meal_times, &overrides.meal_times),
            source: build_source(source_url, overrides),
            images: clean_images(&extraction.images),
            appliance_settings: transform_appliance_settings(&extraction.appliance_settings),
            metadata: build_metadata(extraction, overrides),
        };

        debug!(
            "Transformed '{}': {} ingredients, {} instructions",
            recipe.title,
            recipe.ingredients.len(),
            recipe.instructions.len()
        );
        Ok(recipe)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].trim_end().to_string(),
        None => text,
    }
}

fn clean_title(title: &str) -> String {
    truncate_chars(collapse_whitespace(title), MAX_TITLE_LEN)
}

fn clean_description(description: &str) -> Option<String> {
    let description = truncate_chars(collapse_whitespace(description), MAX_DESCRIPTION_LEN);
    (!description.is_empty()).then_some(description)
}

fn transform_ingredients(extracted: &[ExtractedIngredient]) -> Vec<Ingredient> {
    extracted
        .iter()
        .filter_map(|ingredient| {
            let name = truncate_chars(
                collapse_whitespace(&ingredient.name),
                MAX_INGREDIENT_NAME_LEN,
            );
            if name.is_empty() {
                warn!("Skipping ingredient without a name: {:?}", ingredient);
                return None;
            }

            let amount = truncate_chars(collapse_whitespace(&ingredient.amount), MAX_AMOUNT_LEN);
            let amount = if amount.is_empty() {
                DEFAULT_AMOUNT.to_string()
            } else {
                amount
            };

            let unit = ingredient
                .unit
                .as_deref()
                .and_then(normalize_unit)
                .map(|unit| truncate_chars(unit, MAX_AMOUNT_LEN));

            Some(Ingredient { name, amount, unit })
        })
        .collect()
}

/// Strip list bullets and step numbering ("1.", "2)", "Step 3:")
fn strip_step_marker(text: &str) -> &str {
    let mut rest = text
        .trim()
        .trim_start_matches(['-', '*', '•', '–', '·'])
        .trim_start();

    let mut had_step_word = false;
    if rest.len() >= 4 && rest.is_char_boundary(4) && rest[..4].eq_ignore_ascii_case("step") {
        let after = rest[4..].trim_start();
        if after.starts_with(|c: char| c.is_ascii_digit()) {
            rest = after;
            had_step_word = true;
        }
    }

    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &rest[digits..];
        if let Some(stripped) = after.strip_prefix(['.', ')', ':']) {
            return stripped.trim_start();
        }
        if had_step_word {
            return after.trim_start();
        }
    }

    rest
}

fn transform_instructions(extracted: &[String]) -> Vec<String> {
    extracted
        .iter()
        .map(|step| collapse_whitespace(strip_step_marker(step)))
        .filter(|step| step.chars().count() >= MIN_INSTRUCTION_LEN)
        .collect()
}

fn normalize_difficulty(difficulty: &str) -> Option<Difficulty> {
    match difficulty.trim().to_lowercase().as_str() {
        "easy" | "simple" | "quick" | "beginner" => Some(Difficulty::Easy),
        "medium" | "moderate" | "intermediate" => Some(Difficulty::Medium),
        "hard" | "difficult" | "advanced" | "complex" | "challenging" => Some(Difficulty::Hard),
        _ => None,
    }
}

fn merge_tags(extracted: &[String], additional: &[String]) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    for tag in extracted.iter().chain(additional) {
        let tag = collapse_whitespace(tag).to_lowercase();
        let len = tag.chars().count();
        if !(MIN_TAG_LEN..=MAX_TAG_LEN).contains(&len) {
            continue;
        }
        if tags.len() >= MAX_TAGS && !tags.contains(&tag) {
            debug!("Tag limit reached, dropping '{}'", tag);
            continue;
        }
        tags.insert(tag);
    }
    tags
}

fn merge_meal_times(extracted: &[String], additional: &[String]) -> BTreeSet<MealTime> {
    extracted
        .iter()
        .chain(additional)
        .filter(|value| !value.trim().is_empty())
        .filter_map(|value| match value.parse::<MealTime>() {
            Ok(meal) => Some(meal),
            Err(e) => {
                warn!("Dropping meal time outside the canonical set: {}", e);
                None
            }
        })
        .collect()
}

fn transform_appliance_settings(extracted: &[ExtractedApplianceSetting]) -> Vec<ApplianceSetting> {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(collapse_whitespace)
            .filter(|v| !v.is_empty())
    };

    extracted
        .iter()
        .filter_map(|setting| {
            let appliance_type = match setting.appliance_type.parse::<ApplianceType>() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("Dropping appliance setting: {}", e);
                    return None;
                }
            };

            Some(ApplianceSetting {
                appliance_type,
                temperature_celsius: setting.temperature_celsius,
                heat_level: non_empty(&setting.heat_level),
                duration_minutes: setting.duration_minutes,
                utensils: setting
                    .utensils
                    .iter()
                    .map(|u| collapse_whitespace(u))
                    .filter(|u| !u.is_empty())
                    .collect(),
                notes: non_empty(&setting.notes),
            })
        })
        .collect()
}

fn domain_name(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn build_source(source_url: &str, overrides: &ImportMetadata) -> Source {
    let url = source_url.trim();
    Source {
        source_type: overrides
            .source_type
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_TYPE.to_string()),
        url: (!url.is_empty()).then(|| url.to_string()),
        name: overrides.source_name.clone().or_else(|| domain_name(url)),
    }
}

fn clean_images(images: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    images
        .iter()
        .map(|image| image.trim())
        .filter(|image| image.starts_with("http://") || image.starts_with("https://"))
        .filter(|image| seen.insert(image.to_string()))
        .map(str::to_string)
        .collect()
}

fn build_metadata(extraction: &ExtractionResult, overrides: &ImportMetadata) -> BTreeMap<String, Value> {
    let extraction_metadata = &extraction.extraction_metadata;
    let mut metadata = BTreeMap::new();
    metadata.insert(
        "extraction_method".to_string(),
        Value::from(extraction_metadata.method_used.as_str()),
    );
    if let Some(language) = &extraction_metadata.language_detected {
        metadata.insert("original_language".to_string(), Value::from(language.as_str()));
    }
    for (key, value) in &overrides.extra {
        metadata.insert(key.clone(), value.clone());
    }
    metadata
}
