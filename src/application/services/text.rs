//! Text normalisation shared by indexing, retrieval and answer synthesis.

use std::sync::OnceLock;

use regex::Regex;

/// Lowercased alphanumeric word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn artifact_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)chat doctor|alma|with chat").ok())
        .as_ref()
}

/// Strips scraping artifacts left in the QA corpora and collapses whitespace.
pub fn clean_text(text: &str) -> String {
    let stripped = match artifact_pattern() {
        Some(pattern) => pattern.replace_all(text, ""),
        None => text.into(),
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits cleaned text into sentences ending in `.`, `!` or `?`.
///
/// A terminator only ends a sentence when followed by whitespace, so
/// abbreviations inside a word ("e.g.x") and decimals stay intact.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let ends_here = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if ends_here {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
