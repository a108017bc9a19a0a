// * Post-execution passes over the scoreboard.
// * Enrichment mines the winning specifications table for aliased fields;
// * arbitration then picks one winner per field by score.

use serde_json::{Number, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::record::ResultRecord;
use super::schema::{Field, FieldKind};
use super::types::{first_max_by_score, ExtractionOutcome, FieldExtractionStatus};
use crate::config::constants::ENRICHMENT_SCORE;
use crate::refinery::text::price_from_value;

/// Adds FOUND_IN_SPECS candidates for specification keys listed in `aliases`.
///
/// `aliases` maps lowercased specification keys to schema field names.
/// Only the best-scored specifications outcome is read. Returns the number of
/// candidates added.
pub fn enrich_from_specifications(record: &mut ResultRecord, aliases: &HashMap<String, String>) -> usize {
    let Some(best) = first_max_by_score(record.candidates(Field::Specifications)).cloned() else {
        debug!("Enrichment: No specifications found to enrich from");
        return 0;
    };

    let Value::Array(groups) = &best.value else {
        warn!(source = %best.source, "Enrichment: Specifications value is not a list, skipping");
        return 0;
    };

    let mut added = 0;
    for group in groups {
        let Some(Value::Object(details)) = group.get("details") else {
            continue;
        };

        for (key, raw_value) in details {
            let Some(target) = aliases.get(&key.trim().to_lowercase()) else {
                continue;
            };
            let Some(field) = Field::from_name(target) else {
                warn!(key = %key, target = %target, "Enrichment: Alias points at an unknown field");
                continue;
            };
            let Some(value) = coerce(raw_value, field.kind()) else {
                debug!(key = %key, field = %field, "Enrichment: Value does not fit the field type");
                continue;
            };

            info!(key = %key, field = %field, "Enrichment: Specification key matched");
            record.push(
                field,
                ExtractionOutcome::found(
                    value,
                    format!("specifications (key: {})", key),
                    FieldExtractionStatus::FoundInSpecs,
                    ENRICHMENT_SCORE,
                ),
            );
            added += 1;
        }
    }

    added
}

/// Converts a specification value to the declared kind of its target field
fn coerce(value: &Value, kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::Number => price_from_value(value)
            .and_then(Number::from_f64)
            .map(Value::Number),
        FieldKind::TextList => {
            let items: Vec<Value> = match value {
                Value::String(s) => s
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
                Value::Array(items) => items.iter().filter_map(|item| coerce(item, FieldKind::Text)).collect(),
                _ => Vec::new(),
            };
            (!items.is_empty()).then_some(Value::Array(items))
        }
        FieldKind::Text => {
            let text = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            (!text.is_empty()).then_some(Value::String(text))
        }
        FieldKind::Structured => None,
    }
}

/// Sets every field with candidates to its highest-scored outcome.
/// Equal scores resolve to the earliest appended candidate. Returns the number of fields resolved.
pub fn resolve_best_results(record: &mut ResultRecord) -> usize {
    info!("Resolving best results from scoreboard");

    let winners: Vec<(Field, ExtractionOutcome)> = record
        .scoreboard()
        .iter()
        .filter_map(|(field, candidates)| first_max_by_score(candidates).map(|w| (*field, w.clone())))
        .collect();

    for (field, winner) in &winners {
        debug!(
            field = %field,
            source = %winner.source,
            score = winner.score,
            candidates = record.candidates(*field).len(),
            "Resolved field"
        );
        record.set_winner(*field, winner);
    }

    winners.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn aliases() -> HashMap<String, String> {
        [("merk", "brand"), ("prijs", "price"), ("categorie", "breadcrumbs"), ("kleur", "colour")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn specs(details: Value, score: i32) -> ExtractionOutcome {
        ExtractionOutcome::found(
            json!([{"category": "General", "details": details}]),
            "table",
            FieldExtractionStatus::ModuleHeuristic,
            score,
        )
    }

    #[test]
    fn test_enrichment_coerces_by_field_kind() {
        let mut record = ResultRecord::new();
        record.push(
            Field::Specifications,
            specs(json!({"Merk": " Acme ", "Prijs": "€ 19,99", "Categorie": "Tools, Drills", "Kleur": "Blue"}), 120),
        );

        assert_eq!(enrich_from_specifications(&mut record, &aliases()), 3);

        let brand = &record.candidates(Field::Brand)[0];
        assert_eq!(brand.value, json!("Acme"));
        assert_eq!(brand.source, "specifications (key: Merk)");
        assert_eq!(brand.status, FieldExtractionStatus::FoundInSpecs);
        assert_eq!(brand.score, ENRICHMENT_SCORE);

        assert_eq!(record.candidates(Field::Price)[0].value, json!(19.99));
        assert_eq!(record.candidates(Field::Breadcrumbs)[0].value, json!(["Tools", "Drills"]));
    }

    #[test]
    fn test_enrichment_reads_only_best_specifications() {
        let mut record = ResultRecord::new();
        record.push(Field::Specifications, specs(json!({"Merk": "Low"}), 100));
        record.push(Field::Specifications, specs(json!({"Merk": "High"}), 200));

        enrich_from_specifications(&mut record, &aliases());
        let brands: Vec<&Value> = record.candidates(Field::Brand).iter().map(|o| &o.value).collect();
        assert_eq!(brands, vec![&json!("High")]);
    }

    #[test]
    fn test_enrichment_without_specifications_is_noop() {
        let mut record = ResultRecord::new();
        assert_eq!(enrich_from_specifications(&mut record, &aliases()), 0);
        assert!(record.scoreboard().is_empty());
    }

    #[test]
    fn test_unparseable_price_is_skipped() {
        let mut record = ResultRecord::new();
        record.push(Field::Specifications, specs(json!({"Prijs": "op aanvraag"}), 120));
        assert_eq!(enrich_from_specifications(&mut record, &aliases()), 0);
    }

    #[test]
    fn test_resolve_picks_max_then_first() {
        let mut record = ResultRecord::new();
        for (value, score) in [("a", 50), ("b", 200), ("c", 120)] {
            record.push(Field::Title, ExtractionOutcome::found(value, value, FieldExtractionStatus::ModuleHeuristic, score));
        }
        record.push(Field::Brand, ExtractionOutcome::found("first", "s1", FieldExtractionStatus::JsonLd, 200));
        record.push(Field::Brand, ExtractionOutcome::found("second", "s2", FieldExtractionStatus::OpenGraph, 200));

        assert_eq!(resolve_best_results(&mut record), 2);
        assert_eq!(record.value(Field::Title), Some(&json!("b")));
        assert_eq!(record.value(Field::Brand), Some(&json!("first")));
        assert_eq!(record.status(Field::Brand), Some(FieldExtractionStatus::JsonLd));
        assert_eq!(record.source(Field::Brand), Some("s1"));
        assert_eq!(record.value(Field::Price), None);
    }
}
