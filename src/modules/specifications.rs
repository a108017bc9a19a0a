// * Product specifications as category groups: `[{"category": .., "details": {key: value}}]`.
// * Enrichment later mines these groups for other fields (see core::arbitration).

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::support::{as_text, product_nodes};
use crate::core::context::RequestContext;
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::tables::{SpecificationTable, TableScorer, DEFAULT_CATEGORY};

/// One `{category, details}` group; the first occurrence of a key wins
fn group(category: &str, rows: impl IntoIterator<Item = (String, String)>) -> Option<Value> {
    let mut details = Map::new();
    for (key, value) in rows {
        details.entry(key).or_insert(Value::String(value));
    }
    (!details.is_empty()).then(|| json!({ "category": category, "details": details }))
}

pub struct SpecificationsModule;

impl SpecificationsModule {
    /// schema.org `additionalProperty` PropertyValue entries
    fn from_json_ld(ctx: &RequestContext) -> Option<Value> {
        let rows: Vec<(String, String)> = product_nodes(ctx)
            .into_iter()
            .filter_map(|node| node.get("additionalProperty"))
            .flat_map(|property| match property {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter_map(|property| {
                let name = property.get("name").and_then(as_text)?;
                let value = property.get("value").and_then(as_text)?;
                let value = match property.get("unitText").and_then(as_text) {
                    Some(unit) => format!("{} {}", value, unit),
                    None => value,
                };
                Some((name, value))
            })
            .collect();

        group(DEFAULT_CATEGORY, rows).map(|g| Value::Array(vec![g]))
    }

    /// Key/value tables and definition lists from the cleaned page
    fn from_tables(ctx: &RequestContext) -> Option<Value> {
        let document = ctx.cleaned_document();
        let mut tables: Vec<SpecificationTable> = TableScorer::extract_tables(document);
        tables.extend(TableScorer::extract_definition_lists(document));

        let groups: Vec<Value> = tables
            .into_iter()
            .filter_map(|table| group(&table.category, table.rows))
            .collect();
        (!groups.is_empty()).then_some(Value::Array(groups))
    }
}

impl ExtractorModule for SpecificationsModule {
    fn name(&self) -> &'static str {
        "specifications"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        if let Some(groups) = Self::from_json_ld(ctx) {
            info!("Specifications: Extracted from additionalProperty");
            return Ok(ExtractionOutcome::found(
                groups,
                "json_ld.additionalProperty",
                FieldExtractionStatus::JsonLd,
                200,
            ));
        }

        if let Some(groups) = Self::from_tables(ctx) {
            info!(groups = groups.as_array().map_or(0, Vec::len), "Specifications: Extracted from tables");
            return Ok(ExtractionOutcome::found(
                groups,
                "table / dl",
                FieldExtractionStatus::ModuleHeuristic,
                120,
            ));
        }

        debug!("Specifications: None found");
        Ok(ExtractionOutcome::not_found())
    }
}
