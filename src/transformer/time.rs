//! Duration and servings parsing.
//!
//! Durations become whole minutes only when the text is unambiguous. Ranges
//! ("15-20 minutes") and bare numbers with unknown units yield `None`.

#[derive(Debug, PartialEq)]
enum Token {
    Number(f64),
    Word(String),
}

fn vulgar_fraction(c: char) -> Option<f64> {
    match c {
        '¼' => Some(0.25),
        '½' => Some(0.5),
        '¾' => Some(0.75),
        '⅓' => Some(1.0 / 3.0),
        '⅔' => Some(2.0 / 3.0),
        _ => None,
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut number = String::new();
    let mut word = String::new();

    let flush_number = |number: &mut String, tokens: &mut Vec<Token>| {
        if !number.is_empty() {
            if let Ok(value) = number.replace(',', ".").parse::<f64>() {
                tokens.push(Token::Number(value));
            }
            number.clear();
        }
    };
    let flush_word = |word: &mut String, tokens: &mut Vec<Token>| {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    };

    for c in text.chars() {
        if c.is_ascii_digit() || ((c == '.' || c == ',') && !number.is_empty()) {
            flush_word(&mut word, &mut tokens);
            number.push(c);
        } else if let Some(fraction) = vulgar_fraction(c) {
            flush_word(&mut word, &mut tokens);
            let whole = number.replace(',', ".").parse::<f64>().unwrap_or(0.0);
            number.clear();
            tokens.push(Token::Number(whole + fraction));
        } else if c.is_alphabetic() {
            flush_number(&mut number, &mut tokens);
            word.extend(c.to_lowercase());
        } else {
            flush_number(&mut number, &mut tokens);
            flush_word(&mut word, &mut tokens);
        }
    }
    flush_number(&mut number, &mut tokens);
    flush_word(&mut word, &mut tokens);

    tokens
}

fn unit_minutes(word: &str) -> Option<f64> {
    match word {
        "d" | "day" | "days" => Some(1440.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(60.0),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(1.0),
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1.0 / 60.0),
        _ => None,
    }
}

/// ISO 8601 duration (`PT1H30M`, `PT5400.0S`, `P1DT2H`) to minutes
fn parse_iso_duration(text: &str) -> Option<u32> {
    let rest = text.strip_prefix('p')?;
    let (date_part, time_part) = match rest.split_once('t') {
        Some((date, time)) => (date, time),
        None => (rest, ""),
    };

    let mut total = 0.0;
    let mut found = false;

    for (part, is_time) in [(date_part, false), (time_part, true)] {
        let mut number = String::new();
        for c in part.chars() {
            if c.is_ascii_digit() || c == '.' {
                number.push(c);
                continue;
            }
            let value: f64 = number.parse().ok()?;
            number.clear();
            let minutes = match (c, is_time) {
                ('d', false) => 1440.0,
                ('h', true) => 60.0,
                ('m', true) => 1.0,
                ('s', true) => 1.0 / 60.0,
                _ => return None,
            };
            total += value * minutes;
            found = true;
        }
        if !number.is_empty() {
            return None;
        }
    }

    found.then(|| total.round() as u32)
}

fn parse_free_text(text: &str) -> Option<u32> {
    let mut total = 0.0;
    let mut found = false;
    let mut pending: Option<f64> = None;
    let mut last_unit: Option<f64> = None;

    for token in tokenize(text) {
        match token {
            Token::Number(value) => {
                if pending.is_some() {
                    // two numbers in a row: a range like "15-20"
                    return None;
                }
                pending = Some(value);
            }
            Token::Word(word) => {
                if let Some(minutes) = unit_minutes(&word) {
                    let value = pending.take()?;
                    total += value * minutes;
                    last_unit = Some(minutes);
                    found = true;
                } else if pending.is_some() {
                    // "15 to 20", "4 servings"
                    return None;
                }
            }
        }
    }

    if let Some(value) = pending {
        // "1h30" means 1 hour 30 minutes
        if last_unit == Some(60.0) {
            total += value;
        } else {
            return None;
        }
    }

    found.then(|| total.round() as u32)
}

/// Parse a duration to whole minutes where unambiguous
pub fn parse_minutes(text: &str) -> Option<u32> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    if lowered.chars().all(|c| c.is_ascii_digit()) {
        return lowered.parse().ok();
    }

    if lowered.starts_with("p") && !lowered.contains(' ') {
        return parse_iso_duration(&lowered);
    }

    parse_free_text(&lowered)
}

/// Parse servings; ranges like "4-6" resolve to their lower bound
pub fn parse_servings(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse::<u32>().ok().filter(|servings| *servings >= 1)
}
