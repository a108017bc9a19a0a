// * The extractor module contract.
// * Modules are stateless after construction and shared across concurrent runs.

use super::context::RequestContext;
use super::error::ModuleError;
use super::types::ExtractionOutcome;

/// A named unit of extraction logic
pub trait ExtractorModule: Send + Sync {
    /// Unique module name; for field-declaring modules also the schema field it produces
    fn name(&self) -> &'static str;

    /// Modules whose raw output this module reads. Inactive names are ignored.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Whether the module corresponds 1:1 to a schema field
    fn declares_field(&self) -> bool {
        true
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError>;
}
