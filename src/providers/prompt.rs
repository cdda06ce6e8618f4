use serde_json::{json, Value};

/// The system prompt used for extracting recipes as structured JSON.
///
/// Loaded from `prompt.txt` at compile time so it can be edited without
/// dealing with Rust string syntax.
pub const EXTRACTION_PROMPT: &str = include_str!("prompt.txt");

/// JSON schema the extraction service must answer with
pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": ["string", "null"]},
            "description": {"type": ["string", "null"]},
            "ingredients": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "amount": {"type": "string"},
                        "unit": {"type": ["string", "null"]}
                    },
                    "required": ["name", "amount"]
                }
            },
            "instructions": {"type": "array", "items": {"type": "string"}},
            "prep_time": {"type": ["string", "null"]},
            "cook_time": {"type": ["string", "null"]},
            "servings": {"type": ["string", "null"]},
            "difficulty": {"type": ["string", "null"], "enum": ["easy", "medium", "hard", null]},
            "tags": {"type": "array", "items": {"type": "string"}},
            "meal_times": {
                "type": "array",
                "items": {"enum": ["breakfast", "lunch", "dinner", "snack", "brunch", "dessert"]}
            },
            "appliance_settings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "appliance_type": {
                            "enum": [
                                "gas_burner", "airfryer", "electric_grill", "electric_stove",
                                "induction_stove", "oven", "charcoal_grill", "stove"
                            ]
                        },
                        "temperature_celsius": {"type": ["integer", "null"]},
                        "heat_level": {"type": ["string", "null"]},
                        "duration_minutes": {"type": ["integer", "null"]},
                        "utensils": {"type": "array", "items": {"type": "string"}},
                        "notes": {"type": ["string", "null"]}
                    },
                    "required": ["appliance_type"]
                }
            },
            "images": {"type": "array", "items": {"type": "string"}},
            "language_detected": {"type": ["string", "null"]}
        },
        "required": ["title", "ingredients", "instructions"]
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build the system prompt: base rules, target language, optional page
/// language hint and the response schema.
pub fn build_extraction_prompt(
    schema: &Value,
    target_language: &str,
    language_hint: Option<&str>,
) -> String {
    let mut prompt = EXTRACTION_PROMPT.to_string();

    if let Some(target) = non_blank(Some(target_language)) {
        prompt.push_str(&format!(
            "\nTranslate every text field to {target}. Keep ingredient names recognizable and preserve cooking techniques; only translate, never simplify.\n"
        ));
    }

    if let Some(lang) = non_blank(language_hint) {
        prompt.push_str(&format!(
            "\nThe page declares its language as \"{lang}\".\n"
        ));
    }

    prompt.push_str("\nSchema:\n");
    prompt.push_str(&schema.to_string());
    prompt
}
