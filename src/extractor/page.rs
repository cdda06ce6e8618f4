//! Helpers shared by the strategies for reading an HTML document.

use scraper::{ElementRef, Html, Selector};

const HIDDEN_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "head", "iframe", "button", "form",
];

const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "cite", "code", "data", "em", "i", "label", "mark", "q", "s",
    "small", "span", "strong", "sub", "sup", "time", "u",
];

/// Join an element's text nodes and collapse whitespace
pub(crate) fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Language declared by `<html lang>`, e.g. "ro" for `lang="ro-RO"`
pub(crate) fn document_language(document: &Html) -> Option<String> {
    let lang = document.root_element().value().attr("lang")?;
    let primary = lang.split(['-', '_']).next()?.trim().to_lowercase();
    (!primary.is_empty()).then_some(primary)
}

/// Text content of `<title>`
pub(crate) fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Human-visible text of the page, one line per block element
pub(crate) fn visible_text(document: &Html) -> String {
    let mut output = String::new();
    let mut current_block = None;

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        let block = node
            .ancestors()
            .find(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| !INLINE_ELEMENTS.contains(&el.name()))
            })
            .map(|ancestor| ancestor.id());

        if !output.is_empty() {
            output.push(if block == current_block { ' ' } else { '\n' });
        }
        current_block = block;
        output.push_str(&text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    output
}

/// Cut `text` to at most `max_chars` characters
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
