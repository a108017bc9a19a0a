pub mod constants;
pub mod settings;

pub use settings::{HtmlPreprocessingSettings, LanguagePatternSettings, LanguageSettings, Settings};
