use super::ingredient_line::parse_ingredient_line;
use super::{PageParser, ParseError, ParsingContext};
use crate::model::{ExtractedIngredient, ExtractionMethod, ExtractionResult, MealTime};
use html_escape::decode_html_entities;
use log::debug;
use scraper::Selector;
use serde::Deserialize;
use serde_json::Value;

/// schema.org `Recipe` objects embedded as `application/ld+json`
pub struct JsonLdParser;

#[derive(Debug, Deserialize)]
struct JsonLdRecipe {
    name: String,
    description: Option<TextOrObject>,
    image: Option<Images>,
    #[serde(rename = "recipeIngredient", alias = "ingredients")]
    recipe_ingredient: Option<RecipeIngredients>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<Instructions>,
    #[serde(rename = "recipeYield")]
    recipe_yield: Option<RecipeYield>,
    #[serde(rename = "prepTime")]
    prep_time: Option<String>,
    #[serde(rename = "cookTime")]
    cook_time: Option<String>,
    #[serde(rename = "recipeCategory")]
    recipe_category: Option<TextOrList>,
    #[serde(rename = "recipeCuisine")]
    recipe_cuisine: Option<TextOrList>,
    keywords: Option<TextOrList>,
    #[serde(rename = "inLanguage")]
    in_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextObject {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrObject {
    String(String),
    Object(TextObject),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrList {
    String(String),
    Multiple(Vec<String>),
}

impl TextOrList {
    /// Comma-separated strings and lists both become individual values
    fn into_values(self) -> Vec<String> {
        let values = match self {
            TextOrList::String(s) => vec![s],
            TextOrList::Multiple(v) => v,
        };
        values
            .iter()
            .flat_map(|value| value.split(','))
            .map(|value| decode_html_symbols(value).trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Image {
    Url(String),
    Object(ImageObject),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Images {
    One(Image),
    Multiple(Vec<Image>),
}

#[derive(Debug, Deserialize)]
struct IngredientObject {
    name: String,
    amount: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeIngredients {
    Strings(Vec<String>),
    Objects(Vec<IngredientObject>),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Instructions {
    Text(String),
    Steps(Vec<InstructionItem>),
}

// Section is listed before Step: a step has only optional fields and would
// match any object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionItem {
    Text(String),
    Section(HowToSection),
    Step(HowToStep),
    Nested(Vec<InstructionItem>),
}

#[derive(Debug, Deserialize)]
struct HowToSection {
    #[serde(rename = "itemListElement")]
    item_list_element: Vec<InstructionItem>,
}

#[derive(Debug, Deserialize)]
struct HowToStep {
    text: Option<String>,
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeYield {
    String(String),
    Number(f64),
    Array(Vec<Value>),
}

impl RecipeYield {
    fn into_text(self) -> Option<String> {
        match self {
            RecipeYield::String(s) => Some(s),
            RecipeYield::Number(n) => Some(n.to_string()),
            // prefer the first entry that carries a number
            RecipeYield::Array(values) => values.iter().find_map(|value| match value {
                Value::Number(n) => Some(n.to_string()),
                Value::String(s) if s.chars().any(|c| c.is_ascii_digit()) => Some(s.clone()),
                _ => None,
            }),
        }
    }
}

fn decode_html_symbols(text: &str) -> String {
    // some sites double-encode entities
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

fn flatten_steps(items: Vec<InstructionItem>, steps: &mut Vec<String>) {
    for item in items {
        match item {
            InstructionItem::Text(text) => steps.extend(split_lines(&text)),
            InstructionItem::Section(section) => flatten_steps(section.item_list_element, steps),
            InstructionItem::Step(step) => {
                // Prefer text over name
                if let Some(text) = step.text.or(step.name).or(step.description) {
                    steps.push(decode_html_symbols(&text));
                }
            }
            InstructionItem::Nested(items) => flatten_steps(items, steps),
        }
    }
}

fn split_lines(text: &str) -> Vec<String> {
    decode_html_symbols(text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn convert_ingredients(ingredients: RecipeIngredients) -> Vec<ExtractedIngredient> {
    match ingredients {
        RecipeIngredients::Strings(lines) => lines
            .iter()
            .filter_map(|line| parse_ingredient_line(&decode_html_symbols(line)))
            .collect(),
        RecipeIngredients::Text(text) => split_lines(&text)
            .iter()
            .filter_map(|line| parse_ingredient_line(line))
            .collect(),
        RecipeIngredients::Objects(objects) => objects
            .into_iter()
            .filter(|ing| !ing.name.trim().is_empty())
            .map(|ing| ExtractedIngredient {
                name: decode_html_symbols(&ing.name),
                amount: ing.amount.unwrap_or_default().trim().to_string(),
                unit: None,
            })
            .collect(),
    }
}

fn convert_to_result(recipe: JsonLdRecipe) -> ExtractionResult {
    let mut result = ExtractionResult::empty(ExtractionMethod::RuleBased);

    result.title = Some(decode_html_symbols(&recipe.name));
    result.description = recipe.description.map(|desc| match desc {
        TextOrObject::String(d) => decode_html_symbols(&d),
        TextOrObject::Object(d) => decode_html_symbols(&d.text),
    });

    if let Some(ingredients) = recipe.recipe_ingredient {
        result.ingredients = convert_ingredients(ingredients);
    }

    if let Some(instructions) = recipe.recipe_instructions {
        result.instructions = match instructions {
            Instructions::Text(text) => split_lines(&text),
            Instructions::Steps(items) => {
                let mut steps = Vec::new();
                flatten_steps(items, &mut steps);
                steps
            }
        };
    }

    result.prep_time = recipe.prep_time;
    result.cook_time = recipe.cook_time;
    result.servings = recipe.recipe_yield.and_then(RecipeYield::into_text);

    // Categories naming a meal become meal times, the rest become tags
    if let Some(categories) = recipe.recipe_category {
        for category in categories.into_values() {
            if category.parse::<MealTime>().is_ok() {
                result.meal_times.push(category.to_lowercase());
            } else {
                result.tags.push(category);
            }
        }
    }
    if let Some(cuisine) = recipe.recipe_cuisine {
        result.tags.extend(cuisine.into_values());
    }
    if let Some(keywords) = recipe.keywords {
        result.tags.extend(keywords.into_values());
    }

    result.images = match recipe.image {
        Some(Images::One(image)) => vec![image],
        Some(Images::Multiple(images)) => images,
        None => Vec::new(),
    }
    .into_iter()
    .filter_map(|image| match image {
        Image::Url(url) => Some(decode_html_symbols(&url)),
        Image::Object(object) => object.url,
    })
    .collect();

    result.extraction_metadata.language_detected = recipe.in_language;
    result
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(type_str)) => type_str.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str().is_some_and(|s| s.eq_ignore_ascii_case("recipe"))),
        _ => false,
    }
}

/// Locate a Recipe node in a JSON-LD value: root object, array item or `@graph`
fn find_recipe(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_recipe),
        Value::Object(_) if is_recipe_type(value) => Some(value),
        Value::Object(_) => value.get("@graph").and_then(find_recipe),
        _ => None,
    }
}

/// Repair what commonly breaks JSON-LD blocks: HTML comments, CDATA
/// wrappers, raw control characters in strings and trailing commas.
fn sanitize_json(json_str: &str) -> String {
    let trimmed = json_str
        .trim()
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim()
        .trim_start_matches("//<![CDATA[")
        .trim_end_matches("//]]>")
        .trim();

    let chars: Vec<char> = trimmed.chars().collect();
    let mut cleaned = String::with_capacity(trimmed.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                '\n' | '\r' | '\t' => {
                    cleaned.push(' ');
                    continue;
                }
                _ => {}
            }
            cleaned.push(c);
            continue;
        }

        match c {
            '"' => in_string = true,
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(']' | '}')) {
                    continue;
                }
            }
            _ => {}
        }
        cleaned.push(c);
    }

    cleaned
}

impl PageParser for JsonLdParser {
    fn name(&self) -> &'static str {
        "json_ld"
    }

    fn confidence(&self) -> f32 {
        0.9
    }

    fn parse(&self, context: &ParsingContext) -> Result<ExtractionResult, ParseError> {
        let selector = Selector::parse("script[type='application/ld+json']")
            .map_err(|e| ParseError::Selector(e.to_string()))?;

        for (index, script) in context.document.select(&selector).enumerate() {
            let raw_json = script.inner_html();
            let json_ld = match serde_json::from_str::<Value>(&raw_json)
                .or_else(|_| serde_json::from_str::<Value>(&sanitize_json(&raw_json)))
            {
                Ok(json_ld) => json_ld,
                Err(e) => {
                    debug!("JsonLdParser: failed to parse script {}: {}", index, e);
                    continue;
                }
            };

            let Some(recipe) = find_recipe(&json_ld) else {
                debug!("JsonLdParser: no Recipe node in script {}", index);
                continue;
            };

            match JsonLdRecipe::deserialize(recipe) {
                Ok(recipe) => {
                    debug!("JsonLdParser: found recipe '{}'", recipe.name);
                    return Ok(convert_to_result(recipe));
                }
                Err(e) => debug!("JsonLdParser: Recipe node in script {} rejected: {}", index, e),
            }
        }

        Err(ParseError::NotFound("no Recipe node in any JSON-LD script"))
    }
}
