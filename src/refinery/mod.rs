// * The Refinery: document-level helpers shared by every extractor module.
// * Preprocessing, language detection, patterns, tables, and text normalisation.

pub mod language;
pub mod patterns;
pub mod preprocess;
pub mod resources;
pub mod tables;
pub mod text;

// * Re-exports for convenient access
pub use language::detect_language;
pub use patterns::PatternProvider;
pub use preprocess::{body_text, HtmlPreprocessor};
pub use resources::SharedResources;
pub use tables::{SpecificationTable, TableScorer};
