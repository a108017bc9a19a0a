// * Process-wide, read-only extraction resources.
// * Built once (per analyzer or lazily per process) and shared through Arc.

use std::sync::{Arc, OnceLock};
use tracing::info;

use super::patterns::PatternProvider;
use super::preprocess::HtmlPreprocessor;
use crate::config::Settings;
use crate::core::error::ConfigError;

#[derive(Debug)]
pub struct SharedResources {
    pub patterns: PatternProvider,
    pub preprocessor: HtmlPreprocessor,
}

static GLOBAL: OnceLock<Arc<SharedResources>> = OnceLock::new();

impl SharedResources {
    /// Compiles patterns and noise selectors from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let default_language = settings.language.default.trim().to_lowercase();
        let patterns = PatternProvider::with_overrides(&default_language, &settings.patterns)?;
        let preprocessor = HtmlPreprocessor::new(&settings.html_preprocessing.noise_selectors)?;

        info!(
            default_language = %default_language,
            noise_selectors = preprocessor.selector_count(),
            "Shared resources loaded"
        );

        Ok(Self {
            patterns,
            preprocessor,
        })
    }

    /// Built-in patterns and tag-only preprocessing; cannot fail
    pub fn builtin() -> Self {
        Self {
            patterns: PatternProvider::builtin(crate::config::constants::DEFAULT_LANGUAGE),
            preprocessor: HtmlPreprocessor::tags_only(),
        }
    }

    /// Lazily initialised process-wide instance.
    ///
    /// Concurrent first callers block until the single initialisation finishes.
    /// Falls back to `builtin()` if the default settings fail to compile.
    pub fn global() -> Arc<SharedResources> {
        GLOBAL
            .get_or_init(|| {
                let resources = Self::from_settings(&Settings::default()).unwrap_or_else(|err| {
                    tracing::error!(error = %err, "Default resources failed to load, using built-ins");
                    Self::builtin()
                });
                Arc::new(resources)
            })
            .clone()
    }

    pub fn default_language(&self) -> &str {
        self.patterns.default_language()
    }
}
