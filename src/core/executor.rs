// * Runs the active modules in resolved order and fills the scoreboard.
// * A failing or panicking module is logged and skipped; the run always continues.

use serde_json::Value;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::context::RequestContext;
use super::error::ModuleError;
use super::module::ExtractorModule;
use super::record::ResultRecord;
use super::schema::Field;
use super::types::{is_empty_value, ExtractionOutcome};
use crate::ops::telemetry::panic_message;

/// Counts for one execution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub executed: usize,
    pub produced: usize,
    pub failed: usize,
}

pub struct ModuleExecutor<'a> {
    modules: HashMap<&'static str, &'a (dyn ExtractorModule + 'static)>,
}

impl<'a> ModuleExecutor<'a> {
    pub fn new(modules: &'a [Arc<dyn ExtractorModule>]) -> Self {
        Self {
            modules: modules.iter().map(|m| (m.name(), &**m)).collect(),
        }
    }

    /// Executes each named module once, in `order`
    pub fn execute(
        &self,
        order: &[String],
        ctx: &mut RequestContext,
        record: &mut ResultRecord,
    ) -> ExecutionSummary {
        debug!(order = ?order, "Executor: Running modules in sorted order");
        let mut summary = ExecutionSummary::default();

        for name in order {
            let Some(&module) = self.modules.get(name.as_str()) else {
                warn!(module = %name, "Module was in execution order but is not active");
                continue;
            };

            summary.executed += 1;
            match run_isolated(module, ctx) {
                Ok(outcome) => {
                    if record_outcome(module, outcome, ctx, record) {
                        summary.produced += 1;
                    }
                }
                Err(err) => {
                    summary.failed += 1;
                    error!(module = %name, error = %err, "Error during module execution");
                }
            }
        }

        summary
    }
}

/// Calls `extract` with panics converted into `ModuleError::Panicked`.
/// The panic hook still fires first; the binary installs `install_panic_hook` so it lands in tracing.
fn run_isolated(
    module: &dyn ExtractorModule,
    ctx: &RequestContext,
) -> Result<ExtractionOutcome, ModuleError> {
    catch_unwind(AssertUnwindSafe(|| module.extract(ctx)))
        .unwrap_or_else(|payload| Err(ModuleError::Panicked(panic_message(&*payload))))
}

/// Applies one outcome: context write, own-field entry, sub-key fan-out.
/// Returns false when the outcome was empty and nothing was recorded.
fn record_outcome(
    module: &dyn ExtractorModule,
    outcome: ExtractionOutcome,
    ctx: &mut RequestContext,
    record: &mut ResultRecord,
) -> bool {
    let name = module.name();
    if !outcome.is_found() {
        debug!(module = name, "Module found nothing");
        return false;
    }

    // * Step 1: Raw output is always visible to later modules
    ctx.insert_output(name, outcome.value.clone());

    // * Step 2: The module's own field
    if module.declares_field() {
        if let Some(field) = Field::from_name(name) {
            debug!(module = name, score = outcome.score, status = %outcome.status, "Scoreboard entry added");
            record.push(field, outcome.clone());
        }
    }

    // * Step 3: Keyed outputs seed every other schema field they name
    if let Value::Object(entries) = &outcome.value {
        for (key, sub_value) in entries {
            if key == name || is_empty_value(sub_value) {
                continue;
            }
            let Some(field) = Field::from_name(key) else {
                continue;
            };
            debug!(module = name, field = %field, "Sub-key fanned out to field");
            record.push(
                field,
                ExtractionOutcome {
                    value: sub_value.clone(),
                    source: format!("{} ({})", name, outcome.source),
                    status: outcome.status,
                    score: outcome.score,
                },
            );
        }
    }

    true
}
