// * JSON-LD provider: every `application/ld+json` node on the page, flattened.
// * Downstream modules read this list from the context instead of re-parsing.

use scraper::Selector;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::core::context::RequestContext;
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};

const SOURCE: &str = "script[type='application/ld+json']";

static SELECTOR_JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(SOURCE).expect("Invalid JSON-LD selector"));

pub struct JsonLdModule;

impl ExtractorModule for JsonLdModule {
    fn name(&self) -> &'static str {
        "json_ld"
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let mut nodes = Vec::new();
        let mut scripts = 0;
        let mut failures = 0;

        for script in ctx.raw_document().select(&SELECTOR_JSON_LD) {
            scripts += 1;
            let body: String = script.text().collect();
            match serde_json::from_str::<Value>(body.trim()) {
                Ok(parsed) => flatten(parsed, &mut nodes),
                Err(err) => {
                    failures += 1;
                    warn!(error = %err, "JSON-LD: Error parsing script");
                }
            }
        }

        if nodes.is_empty() {
            if scripts > 0 && failures == scripts {
                return Err(ModuleError::Malformed(format!(
                    "none of {} JSON-LD scripts could be parsed",
                    scripts
                )));
            }
            debug!(scripts, "JSON-LD: No valid nodes found");
            return Ok(ExtractionOutcome::not_found());
        }

        info!(nodes = nodes.len(), "JSON-LD: Raw nodes found");
        Ok(ExtractionOutcome::found(
            Value::Array(nodes),
            SOURCE,
            FieldExtractionStatus::JsonLd,
            200,
        ))
    }
}

/// Lists are spread, `@graph` containers are unpacked, other objects kept as-is
fn flatten(value: Value, nodes: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| flatten(item, nodes)),
        Value::Object(mut map) => match map.remove("@graph") {
            Some(graph) => flatten(graph, nodes),
            None => nodes.push(Value::Object(map)),
        },
        _ => {}
    }
}
