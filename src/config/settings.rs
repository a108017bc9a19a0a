// * Service settings loaded from YAML with environment overrides.
// * Every section has a default so a missing file or key still yields a working analyzer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

use super::constants::{DEFAULT_CONFIG_PATH, DEFAULT_LANGUAGE};
use crate::core::error::ConfigError;

/// Top-level extractor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub language: LanguageSettings,
    pub html_preprocessing: HtmlPreprocessingSettings,
    /// Canonical field name -> specification-key synonyms
    pub field_aliases: BTreeMap<String, Vec<String>>,
    /// Enables the Pro module tier when its modules are registered
    pub pro_enabled: bool,
    /// Per-language pattern overrides merged over the built-in set
    pub patterns: HashMap<String, LanguagePatternSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LanguageSettings {
    pub default: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            default: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct HtmlPreprocessingSettings {
    /// Extra CSS selectors whose elements are removed from the cleaned document
    pub noise_selectors: Vec<String>,
}

/// Keyword lists and regexes for one language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LanguagePatternSettings {
    pub keywords: HashMap<String, Vec<String>>,
    pub regex: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: LanguageSettings::default(),
            html_preprocessing: HtmlPreprocessingSettings {
                noise_selectors: default_noise_selectors(),
            },
            field_aliases: default_field_aliases(),
            pro_enabled: true,
            patterns: HashMap::new(),
        }
    }
}

fn default_noise_selectors() -> Vec<String> {
    [
        "header",
        "footer",
        "nav:not([aria-label*='readcrumb'])",
        "[class*='cookie']",
        "[id*='cookie']",
        "[class*='newsletter']",
        "[role='dialog']",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_field_aliases() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 6] = [
        ("brand", &["brand", "merk", "fabrikant", "manufacturer", "marke"]),
        ("ean", &["ean", "ean-code", "ean code", "gtin", "barcode"]),
        ("sku", &["sku", "artikelnummer", "article number", "item number", "mpn"]),
        ("availability", &["availability", "beschikbaarheid", "voorraad"]),
        ("currency", &["currency", "valuta"]),
        ("price", &["price", "prijs"]),
    ];

    table
        .iter()
        .map(|(field, aliases)| {
            (
                field.to_string(),
                aliases.iter().map(|a| a.to_string()).collect(),
            )
        })
        .collect()
}

impl Settings {
    /// Parses settings from a YAML string
    pub fn from_yaml_str(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
            path: origin.to_string(),
            source,
        })
    }

    /// Reads settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml_str(&content, &display)
    }

    /// Loads settings the way the service does at startup:
    /// 1. `ARGUS_CONFIG` or `config/config.yml` if the file exists
    /// 2. Built-in defaults otherwise
    /// 3. Environment overrides on top
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ARGUS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut settings = if Path::new(&path).exists() {
            info!(path = %path, "Loading settings from YAML");
            Self::from_file(&path)?
        } else {
            warn!(path = %path, "Config file not found, using built-in defaults");
            Self::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Applies `ARGUS_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(lang) = std::env::var("ARGUS_DEFAULT_LANGUAGE") {
            if !lang.trim().is_empty() {
                debug!(lang = %lang, "Default language overridden from environment");
                self.language.default = lang.trim().to_lowercase();
            }
        }

        if let Ok(flag) = std::env::var("ARGUS_PRO_ENABLED") {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.pro_enabled = true,
                "0" | "false" | "no" => self.pro_enabled = false,
                other => warn!(value = %other, "Ignoring unrecognised ARGUS_PRO_ENABLED value"),
            }
        }
    }

    /// Builds the case-insensitive alias -> field lookup used by enrichment
    pub fn alias_map(&self) -> HashMap<String, String> {
        self.field_aliases
            .iter()
            .flat_map(|(field, aliases)| {
                aliases
                    .iter()
                    .map(move |alias| (alias.trim().to_lowercase(), field.clone()))
            })
            .collect()
    }
}
