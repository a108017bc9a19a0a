// * The extraction core: module contract, scheduling, execution, and arbitration.

pub mod analyzer;
pub mod arbitration;
pub mod context;
pub mod error;
pub mod executor;
pub mod module;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod types;

// * Re-exports for convenient access
pub use analyzer::{AnalysisReport, AnalysisRequest, ProductPageAnalyzer};
pub use context::{DocumentKind, RequestContext};
pub use error::{AnalyzerError, ConfigError, CycleError, ModuleError};
pub use executor::{ExecutionSummary, ModuleExecutor};
pub use module::ExtractorModule;
pub use record::ResultRecord;
pub use registry::{ModuleRegistry, ModuleRegistryBuilder, Tier};
pub use resolver::DependencyResolver;
pub use schema::{Field, FieldKind};
pub use types::{ExtractionOutcome, FieldExtractionStatus};
