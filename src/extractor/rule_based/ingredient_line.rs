//! Splits a free-text ingredient line into amount, unit and name.
//!
//! Best effort: a line we cannot split becomes a bare name with no amount,
//! and the transformer fills in the default amount later.

use crate::model::ExtractedIngredient;
use crate::transformer::canonical_unit;

const BULLETS: &[char] = &['-', '*', '•', '–', '·', '▢', '□'];

fn is_fraction_char(c: char) -> bool {
    matches!(c, '½' | '¼' | '¾' | '⅓' | '⅔' | '⅛' | '⅜' | '⅝' | '⅞')
}

/// "2", "1/2", "1.5", "2-3", "½", "1½"
fn is_amount_token(token: &str) -> bool {
    let has_number = token
        .chars()
        .any(|c| c.is_ascii_digit() || is_fraction_char(c));
    has_number
        && token.chars().all(|c| {
            c.is_ascii_digit() || is_fraction_char(c) || matches!(c, '/' | '.' | ',' | '-' | '–')
        })
}

/// "400g" -> ("400", "g") when the suffix is a known unit
fn split_glued_amount(token: &str) -> Option<(&str, &'static str)> {
    let split = token.find(|c: char| c.is_alphabetic())?;
    let (amount, unit) = token.split_at(split);
    if amount.is_empty() || !is_amount_token(amount) {
        return None;
    }
    canonical_unit(unit).map(|canonical| (amount, canonical))
}

fn unit_word(token: &str) -> &str {
    token.trim_end_matches([',', ')']).trim_start_matches('(')
}

pub(crate) fn parse_ingredient_line(line: &str) -> Option<ExtractedIngredient> {
    let line = line.trim().trim_start_matches(BULLETS).trim();
    if line.chars().count() < 2 {
        return None;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut index = 0;
    let mut amount_parts: Vec<&str> = Vec::new();
    let mut unit: Option<String> = None;

    while index < tokens.len() {
        let token = tokens[index];
        if is_amount_token(token) {
            amount_parts.push(token);
            index += 1;
        } else if !amount_parts.is_empty()
            && matches!(token, "-" | "–" | "to" | "or")
            && tokens.get(index + 1).is_some_and(|next| is_amount_token(next))
        {
            // "2 to 3", "1 - 2"
            amount_parts.push(token);
            amount_parts.push(tokens[index + 1]);
            index += 2;
        } else {
            break;
        }
    }

    if amount_parts.is_empty() {
        if let Some((amount, canonical)) = tokens.first().and_then(|t| split_glued_amount(t)) {
            amount_parts.push(amount);
            unit = Some(canonical.to_string());
            index = 1;
        }
    }

    if !amount_parts.is_empty() && unit.is_none() {
        let two_words = tokens
            .get(index..index + 2)
            .map(|pair| format!("{} {}", pair[0], unit_word(pair[1])));
        if let Some(canonical) = two_words.as_deref().and_then(canonical_unit) {
            unit = Some(canonical.to_string());
            index += 2;
        } else if let Some(canonical) = tokens.get(index).and_then(|t| canonical_unit(unit_word(t))) {
            unit = Some(canonical.to_string());
            index += 1;
        }
    }

    let rest = tokens.get(index..).unwrap_or_default();
    let rest = match rest.first() {
        Some(first) if first.eq_ignore_ascii_case("of") => &rest[1..],
        _ => rest,
    };
    let name = rest.join(" ");

    if name.is_empty() {
        // "2 cups" alone: keep the line as the name
        return Some(ExtractedIngredient {
            name: line.to_string(),
            amount: String::new(),
            unit: None,
        });
    }

    Some(ExtractedIngredient {
        name,
        amount: amount_parts.join(" "),
        unit,
    })
}
