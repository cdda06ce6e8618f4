//! Canonical unit tokens.
//!
//! Recognized spellings map onto a small canonical set; anything else is
//! passed through by the caller.

/// (spelling, canonical token). Spellings are lowercase without trailing dots.
const UNIT_ALIASES: &[(&str, &str)] = &[
    // Volume - US
    ("cup", "cup"),
    ("cups", "cup"),
    ("c", "cup"),
    ("tablespoon", "tbsp"),
    ("tablespoons", "tbsp"),
    ("tbsp", "tbsp"),
    ("tbsps", "tbsp"),
    ("tbs", "tbsp"),
    ("tbl", "tbsp"),
    ("tb", "tbsp"),
    ("teaspoon", "tsp"),
    ("teaspoons", "tsp"),
    ("tsp", "tsp"),
    ("tsps", "tsp"),
    ("ts", "tsp"),
    ("fluid ounce", "fl oz"),
    ("fluid ounces", "fl oz"),
    ("fl oz", "fl oz"),
    ("fl. oz", "fl oz"),
    ("pint", "pint"),
    ("pints", "pint"),
    ("pt", "pint"),
    ("quart", "quart"),
    ("quarts", "quart"),
    ("qt", "quart"),
    ("gallon", "gallon"),
    ("gallons", "gallon"),
    ("gal", "gallon"),
    // Volume - Metric
    ("milliliter", "ml"),
    ("milliliters", "ml"),
    ("millilitre", "ml"),
    ("millilitres", "ml"),
    ("ml", "ml"),
    ("centiliter", "cl"),
    ("centiliters", "cl"),
    ("cl", "cl"),
    ("deciliter", "dl"),
    ("deciliters", "dl"),
    ("dl", "dl"),
    ("liter", "l"),
    ("liters", "l"),
    ("litre", "l"),
    ("litres", "l"),
    ("l", "l"),
    // Weight
    ("gram", "g"),
    ("grams", "g"),
    ("gr", "g"),
    ("g", "g"),
    ("kilogram", "kg"),
    ("kilograms", "kg"),
    ("kilo", "kg"),
    ("kilos", "kg"),
    ("kg", "kg"),
    ("milligram", "mg"),
    ("milligrams", "mg"),
    ("mg", "mg"),
    ("ounce", "oz"),
    ("ounces", "oz"),
    ("oz", "oz"),
    ("pound", "lb"),
    ("pounds", "lb"),
    ("lb", "lb"),
    ("lbs", "lb"),
    // Count
    ("pinch", "pinch"),
    ("pinches", "pinch"),
    ("dash", "dash"),
    ("dashes", "dash"),
    ("clove", "clove"),
    ("cloves", "clove"),
    ("can", "can"),
    ("cans", "can"),
    ("piece", "piece"),
    ("pieces", "piece"),
    ("pc", "piece"),
    ("pcs", "piece"),
    ("slice", "slice"),
    ("slices", "slice"),
    ("bunch", "bunch"),
    ("bunches", "bunch"),
    ("sprig", "sprig"),
    ("sprigs", "sprig"),
    ("stick", "stick"),
    ("sticks", "stick"),
    ("package", "package"),
    ("packages", "package"),
    ("pkg", "package"),
    ("handful", "handful"),
    ("handfuls", "handful"),
];

/// Canonical token for a unit spelling, if recognized
pub fn canonical_unit(unit: &str) -> Option<&'static str> {
    let wanted = unit.trim().trim_end_matches('.').to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    UNIT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == wanted)
        .map(|(_, canonical)| *canonical)
}

/// Coerce a unit to its canonical token, passing unknown units through verbatim
pub fn normalize_unit(unit: &str) -> Option<String> {
    let trimmed = unit.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(match canonical_unit(trimmed) {
        Some(canonical) => canonical.to_string(),
        None => trimmed.to_string(),
    })
}
