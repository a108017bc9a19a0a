use argus_extractor::core::arbitration::{enrich_from_specifications, resolve_best_results};
use argus_extractor::core::{ExtractionOutcome, Field, FieldExtractionStatus, ResultRecord};
use argus_extractor::Settings;
use serde_json::{json, Value};

// * Test Suite for enrichment and per-field arbitration

fn outcome(value: Value, source: &str, score: i32) -> ExtractionOutcome {
    ExtractionOutcome::found(value, source, FieldExtractionStatus::ModuleHeuristic, score)
}

#[test]
fn test_highest_score_wins() {
    let mut record = ResultRecord::new();
    record.push(Field::Price, outcome(json!(10.0), "a", 50));
    record.push(Field::Price, outcome(json!(12.0), "b", 200));
    record.push(Field::Price, outcome(json!(11.0), "c", 120));

    assert_eq!(resolve_best_results(&mut record), 1);
    assert_eq!(record.value(Field::Price), Some(&json!(12.0)));
    assert_eq!(record.source(Field::Price), Some("b"));
}

#[test]
fn test_tie_keeps_first_appended() {
    let mut record = ResultRecord::new();
    record.push(Field::Title, outcome(json!("First"), "first", 200));
    record.push(Field::Title, outcome(json!("Second"), "second", 200));

    resolve_best_results(&mut record);
    assert_eq!(record.value(Field::Title), Some(&json!("First")));
}

#[test]
fn test_fields_without_candidates_stay_null() {
    let mut record = ResultRecord::new();
    record.push(Field::Brand, outcome(json!("Acme"), "label", 120));
    resolve_best_results(&mut record);

    let data = record.final_results();
    assert_eq!(data.len(), Field::ALL.len());
    assert_eq!(data["brand"], json!("Acme"));
    assert!(data["price"].is_null());
    assert!(!record.status_map().contains_key("price"));

    // * BTreeMap keys come out sorted
    let keys: Vec<&String> = data.keys().collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_enrichment_adds_candidates_from_default_aliases() {
    let aliases = Settings::default().alias_map();
    let mut record = ResultRecord::new();
    record.push(
        Field::Specifications,
        outcome(json!([{"category": "General", "details": {"Merk": " Acme ", "Gewicht": "1 kg"}}]), "table / dl", 120),
    );

    assert_eq!(enrich_from_specifications(&mut record, &aliases), 1);
    let brand = &record.candidates(Field::Brand)[0];
    assert_eq!(brand.value, json!("Acme"));
    assert_eq!(brand.source, "specifications (key: Merk)");
    assert_eq!(brand.status, FieldExtractionStatus::FoundInSpecs);
    assert_eq!(brand.score, 150);
}

#[test]
fn test_enrichment_does_not_override_stronger_candidate() {
    let aliases = Settings::default().alias_map();
    let mut record = ResultRecord::new();
    record.push(Field::Brand, ExtractionOutcome::found("Bosch", "json_ld.brand", FieldExtractionStatus::JsonLd, 250));
    record.push(
        Field::Specifications,
        outcome(json!([{"category": "General", "details": {"Brand": "Other"}}]), "table / dl", 120),
    );

    enrich_from_specifications(&mut record, &aliases);
    resolve_best_results(&mut record);

    assert_eq!(record.candidates(Field::Brand).len(), 2);
    assert_eq!(record.value(Field::Brand), Some(&json!("Bosch")));
    assert_eq!(record.status(Field::Brand), Some(FieldExtractionStatus::JsonLd));
}

#[test]
fn test_enrichment_beats_weaker_candidate() {
    let aliases = Settings::default().alias_map();
    let mut record = ResultRecord::new();
    record.push(Field::Brand, outcome(json!("label guess"), "label + sibling", 120));
    record.push(
        Field::Specifications,
        outcome(json!([{"category": "General", "details": {"Manufacturer": "Makita"}}]), "table / dl", 120),
    );

    enrich_from_specifications(&mut record, &aliases);
    resolve_best_results(&mut record);

    assert_eq!(record.value(Field::Brand), Some(&json!("Makita")));
    assert_eq!(record.status(Field::Brand), Some(FieldExtractionStatus::FoundInSpecs));
}

#[test]
fn test_enrichment_reads_only_best_specifications() {
    let aliases = Settings::default().alias_map();
    let mut record = ResultRecord::new();
    record.push(
        Field::Specifications,
        outcome(json!([{"category": "General", "details": {"Merk": "Weak"}}]), "table / dl", 120),
    );
    record.push(
        Field::Specifications,
        outcome(json!([{"category": "General", "details": {"Merk": "Strong"}}]), "json_ld.additionalProperty", 200),
    );

    assert_eq!(enrich_from_specifications(&mut record, &aliases), 1);
    assert_eq!(record.candidates(Field::Brand)[0].value, json!("Strong"));
}

#[test]
fn test_enrichment_without_specifications_is_a_no_op() {
    let aliases = Settings::default().alias_map();
    let mut record = ResultRecord::new();
    assert_eq!(enrich_from_specifications(&mut record, &aliases), 0);
    assert!(record.scoreboard().is_empty());
}
