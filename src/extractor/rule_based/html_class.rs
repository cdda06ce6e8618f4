use super::ingredient_line::parse_ingredient_line;
use super::{PageParser, ParseError, ParsingContext};
use crate::extractor::page::element_text;
use crate::model::{ExtractionMethod, ExtractionResult};
use log::debug;
use scraper::{Html, Selector};

/// Markup of common recipe-card plugins (WPRM, Tasty, Mediavine, WP Zoom, ...)
pub struct HtmlClassParser;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Ingredients,
    Instructions,
    PrepTime,
    CookTime,
    Servings,
}

impl Field {
    fn classes(self) -> &'static [&'static str] {
        match self {
            Field::Title => &[
                "wprm-recipe-name",
                "tasty-recipes-title",
                "mv-create-title",
                "recipe-name",
                "recipe-title",
                "recipe-card-title",
                "wprp-recipe-title",
                "wpzoom-recipe-card-title",
                "recipe-card__title",
                "wpupg-recipe-name",
            ],
            Field::Description => &[
                "wprm-recipe-summary",
                "tasty-recipes-description",
                "mv-create-description",
                "recipe-summary",
                "recipe-description",
                "recipe-card-summary",
                "wpzoom-recipe-summary",
                "recipe-intro",
            ],
            Field::Ingredients => &[
                "wprm-recipe-ingredient",
                "wprm-recipe-ingredients-container",
                "tasty-recipes-ingredients",
                "mv-create-ingredients",
                "recipe-ingredients",
                "recipe-ingredient-list",
                "recipe-card-ingredients",
                "wpzoom-recipe-ingredients",
                "structured-ingredients",
                "recipe_ingredients",
            ],
            Field::Instructions => &[
                "wprm-recipe-instruction-text",
                "wprm-recipe-instructions-container",
                "tasty-recipes-instructions",
                "mv-create-instructions",
                "recipe-instructions",
                "recipe-instruction-list",
                "recipe-card-instructions",
                "wpzoom-recipe-instructions",
                "structured-instructions",
                "recipe_instructions",
                "recipe-directions",
                "directions",
            ],
            Field::PrepTime => &[
                "wprm-recipe-prep_time-container",
                "wprm-recipe-prep-time",
                "tasty-recipes-prep-time",
                "mv-create-time-prep",
                "recipe-prep-time",
                "prep-time",
            ],
            Field::CookTime => &[
                "wprm-recipe-cook_time-container",
                "wprm-recipe-cook-time",
                "tasty-recipes-cook-time",
                "mv-create-time-active",
                "recipe-cook-time",
                "cook-time",
            ],
            Field::Servings => &[
                "wprm-recipe-servings",
                "tasty-recipes-yield",
                "mv-create-yield",
                "recipe-servings",
                "recipe-yield",
                "recipeyield",
            ],
        }
    }
}

fn class_selector(class_name: &str) -> Result<Selector, ParseError> {
    Selector::parse(&format!(".{class_name}")).map_err(|e| ParseError::Selector(e.to_string()))
}

fn find_text(document: &Html, field: Field) -> Result<Option<String>, ParseError> {
    for class_name in field.classes() {
        let selector = class_selector(class_name)?;
        if let Some(text) = document
            .select(&selector)
            .map(element_text)
            .find(|text| !text.is_empty())
        {
            debug!("Found text using class: {}", class_name);
            return Ok(Some(text));
        }
    }
    Ok(None)
}

/// Items of the first matching container: `li` children, else the
/// containers' own text when the class marks individual items
fn find_items(document: &Html, field: Field) -> Result<Vec<String>, ParseError> {
    let li = Selector::parse("li").map_err(|e| ParseError::Selector(e.to_string()))?;

    for class_name in field.classes() {
        let selector = class_selector(class_name)?;
        let containers: Vec<_> = document.select(&selector).collect();
        if containers.is_empty() {
            continue;
        }

        let mut items: Vec<String> = containers
            .iter()
            .flat_map(|container| container.select(&li).map(element_text))
            .filter(|text| !text.is_empty())
            .collect();

        if items.is_empty() {
            items = containers
                .iter()
                .map(|container| element_text(*container))
                .filter(|text| !text.is_empty() && text.len() < 1000)
                .collect();
        }

        if !items.is_empty() {
            debug!("Found {} items using class: {}", items.len(), class_name);
            return Ok(items);
        }
    }

    Ok(Vec::new())
}

/// "Prep Time: 15 minutes" -> "15 minutes"
fn strip_label(text: String) -> String {
    match text.split_once(':') {
        Some((_, value)) if !value.trim().is_empty() => value.trim().to_string(),
        _ => text,
    }
}

impl PageParser for HtmlClassParser {
    fn name(&self) -> &'static str {
        "html_class"
    }

    fn confidence(&self) -> f32 {
        0.6
    }

    fn parse(&self, context: &ParsingContext) -> Result<ExtractionResult, ParseError> {
        debug!("Attempting to extract recipe using HTML class matchers");
        let document = &context.document;

        let ingredients = find_items(document, Field::Ingredients)?;
        let instructions = find_items(document, Field::Instructions)?;
        if ingredients.is_empty() && instructions.is_empty() {
            return Err(ParseError::NotFound("no recipe-card markup"));
        }

        let mut result = ExtractionResult::empty(ExtractionMethod::RuleBased);

        result.title = match find_text(document, Field::Title)? {
            Some(title) => Some(title),
            // Try h1 as fallback
            None => {
                let h1 = Selector::parse("h1").map_err(|e| ParseError::Selector(e.to_string()))?;
                document
                    .select(&h1)
                    .map(element_text)
                    .find(|text| !text.is_empty())
            }
        };
        result.description = find_text(document, Field::Description)?;
        result.ingredients = ingredients
            .iter()
            .filter_map(|line| parse_ingredient_line(line))
            .collect();
        result.instructions = instructions;
        result.prep_time = find_text(document, Field::PrepTime)?.map(strip_label);
        result.cook_time = find_text(document, Field::CookTime)?.map(strip_label);
        result.servings = find_text(document, Field::Servings)?.map(strip_label);

        debug!(
            "HTML class parser: {} ingredients, {} instructions",
            result.ingredients.len(),
            result.instructions.len()
        );
        Ok(result)
    }
}
