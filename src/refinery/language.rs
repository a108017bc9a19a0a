// * Page language detection.
// * Order: <html lang> attribute, stopword vote over the cleaned text, configured default.

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::patterns::{PatternProvider, STOPWORDS};
use super::preprocess::body_text;
use crate::config::constants::MIN_STOPWORD_HITS;

static SELECTOR_HTML_LANG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("html[lang]").expect("Invalid html lang selector"));

/// Detects the page language as a lowercase primary subtag ("nl", "en", ...)
pub fn detect_language(raw: &Html, cleaned: &Html, patterns: &PatternProvider) -> String {
    if let Some(lang) = declared_language(raw) {
        debug!(lang = %lang, "Language taken from <html lang>");
        return lang;
    }

    if let Some(lang) = vote_by_stopwords(&body_text(cleaned), patterns) {
        debug!(lang = %lang, "Language detected from stopwords");
        return lang;
    }

    let fallback = patterns.default_language().to_string();
    debug!(lang = %fallback, "Language detection inconclusive, using default");
    fallback
}

/// "nl-NL" -> "nl", "EN_us" -> "en"; rejects values that are not 2-3 letters
fn declared_language(raw: &Html) -> Option<String> {
    let value = raw
        .select(&SELECTOR_HTML_LANG)
        .next()
        .and_then(|el| el.value().attr("lang"))?;

    let primary = value
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let valid = (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    valid.then_some(primary)
}

fn vote_by_stopwords(text: &str, patterns: &PatternProvider) -> Option<String> {
    let words: Vec<String> = text.unicode_words().map(str::to_lowercase).collect();
    if words.is_empty() {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    // * languages() is sorted, so equal counts resolve alphabetically
    for lang in patterns.languages() {
        let stopwords: HashSet<&str> = patterns
            .keywords_for(lang, STOPWORDS)
            .iter()
            .map(String::as_str)
            .collect();
        if stopwords.is_empty() {
            continue;
        }

        let hits = words.iter().filter(|w| stopwords.contains(w.as_str())).count();
        if hits >= MIN_STOPWORD_HITS && best.map_or(true, |(_, top)| hits > top) {
            best = Some((lang, hits));
        }
    }

    best.map(|(lang, _)| lang.to_string())
}
