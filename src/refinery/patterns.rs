// * Language-specific keyword lists and regexes consumed by the field modules.
// * Built-in lists cover English and Dutch; YAML settings are merged on top.
// * All regexes are compiled when the provider is built. It is read-only afterwards.

use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::LanguagePatternSettings;
use crate::core::error::ConfigError;

// * Pattern names used by the built-in modules
pub const STOPWORDS: &str = "stopwords";
pub const AVAILABILITY_IN_STOCK: &str = "availability_in_stock";
pub const AVAILABILITY_OUT_OF_STOCK: &str = "availability_out_of_stock";
pub const AVAILABILITY_PREORDER: &str = "availability_preorder";
pub const BRAND_LABELS: &str = "brand_labels";
pub const GENERIC_BRAND_TEXT: &str = "generic_brand_text";
pub const DESCRIPTION_HEADINGS: &str = "description_headings";
pub const PRICE_AMOUNT: &str = "price_amount";
pub const BREADCRUMB_FILTER: &str = "breadcrumb_filter";

// * Amount with a currency marker on either side: "€ 19,99", "19.99 EUR", "$1,299.00"
const PRICE_AMOUNT_REGEX: &str = r"(?:€|EUR|\$|USD|£|GBP)\s?\d{1,3}(?:[.,\s]\d{3})*(?:[.,](?:\d{2}|-))?|\d{1,3}(?:[.,]\d{3})*[.,]\d{2}\s?(?:€|EUR|\$|USD|£|GBP)";

type KeywordTable = &'static [(&'static str, &'static [&'static str])];

const ENGLISH_KEYWORDS: KeywordTable = &[
    (
        STOPWORDS,
        &[
            "the", "and", "with", "for", "this", "that", "you", "your", "are", "from", "our",
            "free", "delivery", "order", "shipping",
        ],
    ),
    (
        AVAILABILITY_IN_STOCK,
        &["in stock", "available", "ships today", "ready to ship"],
    ),
    (
        AVAILABILITY_OUT_OF_STOCK,
        &["out of stock", "not in stock", "sold out", "unavailable", "currently not available"],
    ),
    (
        AVAILABILITY_PREORDER,
        &["pre-order", "preorder", "expected", "coming soon", "back order"],
    ),
    (BRAND_LABELS, &["brand", "manufacturer", "made by"]),
    (
        GENERIC_BRAND_TEXT,
        &["all brands", "shop by brand", "view all", "more from", "brands"],
    ),
    (BREADCRUMB_FILTER, &["home", "homepage", "back", "you are here"]),
    (
        DESCRIPTION_HEADINGS,
        &["description", "product description", "product details", "about this item", "overview"],
    ),
];

const DUTCH_KEYWORDS: KeywordTable = &[
    (
        STOPWORDS,
        &[
            "de", "het", "een", "en", "van", "voor", "met", "niet", "ook", "wij", "jouw", "uw",
            "bestellen", "bezorging", "gratis",
        ],
    ),
    (
        AVAILABILITY_IN_STOCK,
        &["op voorraad", "direct leverbaar", "beschikbaar", "morgen in huis"],
    ),
    (
        AVAILABILITY_OUT_OF_STOCK,
        &["niet op voorraad", "uitverkocht", "niet leverbaar", "niet beschikbaar"],
    ),
    (
        AVAILABILITY_PREORDER,
        &["voorbestellen", "verwacht", "verwachte levertijd", "binnenkort"],
    ),
    (BRAND_LABELS, &["merk", "fabrikant"]),
    (
        GENERIC_BRAND_TEXT,
        &["alle merken", "bekijk alle", "meer van", "merken"],
    ),
    (BREADCRUMB_FILTER, &["home", "startpagina", "terug", "u bent hier"]),
    (
        DESCRIPTION_HEADINGS,
        &["beschrijving", "productbeschrijving", "productomschrijving", "omschrijving"],
    ),
];

/// Patterns for a single language
#[derive(Debug, Clone, Default)]
struct LanguagePatterns {
    keywords: HashMap<String, Vec<String>>,
    regexes: HashMap<String, Regex>,
}

/// Immutable lookup of keyword lists and compiled regexes per language
#[derive(Debug, Clone)]
pub struct PatternProvider {
    languages: HashMap<String, LanguagePatterns>,
    default_language: String,
}

impl PatternProvider {
    /// Built-in English and Dutch patterns only
    pub fn builtin(default_language: &str) -> Self {
        let mut languages = HashMap::new();

        for (lang, table) in [("en", ENGLISH_KEYWORDS), ("nl", DUTCH_KEYWORDS)] {
            let mut patterns = LanguagePatterns::default();
            for (name, words) in table.iter() {
                patterns.keywords.insert(
                    name.to_string(),
                    words.iter().map(|w| w.to_string()).collect(),
                );
            }
            languages.insert(lang.to_string(), patterns);
        }

        // * The price regex is language-neutral; registering it under "en" makes
        // * it reachable through the default-language fallback as well.
        if let Some(en) = languages.get_mut("en") {
            if let Ok(regex) = Regex::new(PRICE_AMOUNT_REGEX) {
                en.regexes.insert(PRICE_AMOUNT.to_string(), regex);
            }
        }

        Self {
            languages,
            default_language: default_language.to_string(),
        }
    }

    /// Built-in patterns with the configured overrides merged on top.
    ///
    /// Keyword lists are unioned (order kept, duplicates dropped); a configured
    /// regex replaces the built-in one with the same name.
    pub fn with_overrides(
        default_language: &str,
        overrides: &HashMap<String, LanguagePatternSettings>,
    ) -> Result<Self, ConfigError> {
        let mut provider = Self::builtin(default_language);

        for (lang, custom) in overrides {
            let lang_key = lang.to_lowercase();
            let entry = provider.languages.entry(lang_key.clone()).or_default();

            for (name, words) in &custom.keywords {
                let list = entry.keywords.entry(name.clone()).or_default();
                for word in words {
                    let word = word.trim().to_lowercase();
                    if !word.is_empty() && !list.contains(&word) {
                        list.push(word);
                    }
                }
            }

            for (name, pattern) in &custom.regex {
                let compiled = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    lang: lang_key.clone(),
                    name: name.clone(),
                    source,
                })?;
                debug!(lang = %lang_key, pattern = %name, "Custom regex registered");
                entry.regexes.insert(name.clone(), compiled);
            }
        }

        info!(
            languages = provider.languages.len(),
            "PatternProvider initialized"
        );
        Ok(provider)
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Languages with at least one pattern, sorted
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }

    /// Request language first, then the default language, without duplicates
    fn active_languages<'a>(&'a self, lang: &'a str) -> Vec<&'a str> {
        let mut langs = vec![lang];
        if self.default_language != lang {
            langs.push(self.default_language.as_str());
        }
        langs
    }

    /// Combined keyword list for the request language and the default language
    pub fn keywords(&self, lang: &str, name: &str) -> Vec<String> {
        let mut combined: Vec<String> = Vec::new();
        for active in self.active_languages(lang) {
            if let Some(words) = self
                .languages
                .get(active)
                .and_then(|patterns| patterns.keywords.get(name))
            {
                for word in words {
                    if !combined.contains(word) {
                        combined.push(word.clone());
                    }
                }
            }
        }
        combined
    }

    /// Keywords for exactly one language (no default fallback)
    pub fn keywords_for(&self, lang: &str, name: &str) -> &[String] {
        self.languages
            .get(lang)
            .and_then(|patterns| patterns.keywords.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First compiled regex found for the request language, then the default
    pub fn regex(&self, lang: &str, name: &str) -> Option<&Regex> {
        self.active_languages(lang).into_iter().find_map(|active| {
            self.languages
                .get(active)
                .and_then(|patterns| patterns.regexes.get(name))
        })
    }
}
