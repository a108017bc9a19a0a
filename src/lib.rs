pub mod config;
pub mod core;
pub mod modules;
pub mod ops;
pub mod refinery;

pub use crate::core::{
    AnalysisReport, AnalysisRequest, AnalyzerError, ExtractionOutcome, ExtractorModule, Field,
    FieldExtractionStatus, ProductPageAnalyzer, RequestContext, Tier,
};
pub use config::Settings;
