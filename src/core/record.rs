// * Per-request result accumulator: the scoreboard plus the resolved winners.
// * Created fresh for each run and dropped with it.

use serde_json::Value;
use std::collections::BTreeMap;

use super::schema::Field;
use super::types::{ExtractionOutcome, FieldExtractionStatus};

#[derive(Debug, Default)]
pub struct ResultRecord {
    // * Append-only candidate lists, per field, in append order
    scoreboard: BTreeMap<Field, Vec<ExtractionOutcome>>,
    values: BTreeMap<Field, Value>,
    field_status: BTreeMap<Field, FieldExtractionStatus>,
    selectors_used: BTreeMap<Field, String>,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, outcome: ExtractionOutcome) {
        self.scoreboard.entry(field).or_default().push(outcome);
    }

    /// Candidates for a field in append order
    pub fn candidates(&self, field: Field) -> &[ExtractionOutcome] {
        self.scoreboard.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn scoreboard(&self) -> &BTreeMap<Field, Vec<ExtractionOutcome>> {
        &self.scoreboard
    }

    /// Stores the winning outcome for a field
    pub fn set_winner(&mut self, field: Field, winner: &ExtractionOutcome) {
        self.values.insert(field, winner.value.clone());
        self.field_status.insert(field, winner.status);
        self.selectors_used.insert(field, winner.source.clone());
    }

    pub fn value(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    pub fn status(&self, field: Field) -> Option<FieldExtractionStatus> {
        self.field_status.get(&field).copied()
    }

    pub fn source(&self, field: Field) -> Option<&str> {
        self.selectors_used.get(&field).map(String::as_str)
    }

    /// Every schema field, sorted by name, null where nothing won
    pub fn final_results(&self) -> BTreeMap<String, Value> {
        Field::ALL
            .iter()
            .map(|field| {
                let value = self.values.get(field).cloned().unwrap_or(Value::Null);
                (field.as_str().to_string(), value)
            })
            .collect()
    }

    /// Winning status per resolved field only
    pub fn status_map(&self) -> BTreeMap<String, FieldExtractionStatus> {
        self.field_status
            .iter()
            .map(|(field, status)| (field.as_str().to_string(), *status))
            .collect()
    }

    /// Winning source per resolved field only
    pub fn source_map(&self) -> BTreeMap<String, String> {
        self.selectors_used
            .iter()
            .map(|(field, source)| (field.as_str().to_string(), source.clone()))
            .collect()
    }
}
