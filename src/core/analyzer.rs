// * Product page analyzer: the per-request pipeline.
// * Context -> Resolver -> Executor -> Enrichment -> Arbitration -> Report.
// * The analyzer itself is Send + Sync and holds only read-only shared state;
// * everything mutable lives in the run's own context and record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::arbitration::{enrich_from_specifications, resolve_best_results};
use super::context::RequestContext;
use super::error::{AnalyzerError, ConfigError};
use super::executor::ModuleExecutor;
use super::record::ResultRecord;
use super::registry::{ModuleRegistry, Tier};
use super::resolver::DependencyResolver;
use super::types::FieldExtractionStatus;
use crate::config::Settings;
use crate::ops::telemetry::{PipelineStats, PipelineStatsSnapshot};
use crate::refinery::resources::SharedResources;

/// One page to analyze
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub html: String,
    pub url: String,
    pub use_llm: bool,
    pub tier: Tier,
}

impl AnalysisRequest {
    pub fn new(html: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_llm(mut self, use_llm: bool) -> Self {
        self.use_llm = use_llm;
        self
    }
}

/// Final product record plus provenance debug maps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Every schema field, sorted by name, null when nothing won
    pub data: BTreeMap<String, Value>,
    pub field_status: BTreeMap<String, FieldExtractionStatus>,
    pub selectors_used: BTreeMap<String, String>,
}

pub struct ProductPageAnalyzer {
    registry: Arc<ModuleRegistry>,
    resources: Arc<SharedResources>,
    aliases: HashMap<String, String>,
    stats: PipelineStats,
}

impl ProductPageAnalyzer {
    /// Builds resources and the built-in registry from settings
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let resources = Arc::new(SharedResources::from_settings(settings)?);
        let registry = Arc::new(ModuleRegistry::builtin(settings.pro_enabled)?);
        let analyzer = Self::with_parts(registry, resources, settings.alias_map());

        info!(
            modules = analyzer.registry.len(),
            pro_available = analyzer.registry.pro_available(),
            "Analyzer initialized"
        );
        Ok(analyzer)
    }

    /// Assembles an analyzer from already-built parts
    pub fn with_parts(
        registry: Arc<ModuleRegistry>,
        resources: Arc<SharedResources>,
        aliases: HashMap<String, String>,
    ) -> Self {
        Self {
            registry,
            resources,
            aliases,
            stats: PipelineStats::new(),
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn stats(&self) -> PipelineStatsSnapshot {
        self.stats.snapshot()
    }

    /// Runs the whole pipeline for one page.
    ///
    /// Only a dependency cycle fails the run; module errors degrade to null fields.
    #[instrument(skip_all, fields(url = %request.url, tier = ?request.tier))]
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalyzerError> {
        info!("Analyzer: Starting analysis");

        // * Step 1: Active modules and their order; a cycle aborts before anything runs
        let modules = self.registry.active_modules(request.tier);
        let order = DependencyResolver::from_modules(&modules)
            .sort()
            .map_err(|err| {
                error!(error = %err, "Analyzer: Dependency resolution failed");
                self.stats.record_failed_run();
                err
            })?;
        info!(order = ?order, "Analyzer: Execution order resolved");

        // * Step 2: Fresh, exclusively owned workspace for this run
        let mut ctx = RequestContext::new(
            &request.html,
            &request.url,
            request.use_llm,
            Arc::clone(&self.resources),
        );
        let mut record = ResultRecord::new();

        // * Step 3: Execute modules
        let summary = ModuleExecutor::new(&modules).execute(&order, &mut ctx, &mut record);

        // * Step 4: Enrich from specifications
        let enriched = enrich_from_specifications(&mut record, &self.aliases);

        // * Step 5: Pick a winner per field
        let resolved = resolve_best_results(&mut record);

        self.stats.record_run(summary.executed, summary.failed, resolved, enriched);
        info!(
            executed = summary.executed,
            failed = summary.failed,
            resolved,
            enriched,
            "Analyzer: Full analysis completed"
        );

        Ok(AnalysisReport {
            data: record.final_results(),
            field_status: record.status_map(),
            selectors_used: record.source_map(),
        })
    }
}
