// * Building blocks shared by every module: the reliability tiers and the extraction outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Reliability tier of an extracted value, from least to most trustworthy.
///
/// The ordering is for provenance and human-facing reasoning only.
/// Arbitration compares `ExtractionOutcome::score`, never this rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldExtractionStatus {
    NotFound = 0,
    GenericFallback = 1,
    NlpHeuristic = 2,
    ModuleHeuristic = 3,
    ModuleRegex = 4,
    FoundInSpecs = 5,
    DomainMapping = 6,
    OpenGraph = 7,
    JsonLd = 8,
    FoundInSharedContext = 9,
}

impl FieldExtractionStatus {
    /// Integer rank backing the total order
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::GenericFallback => "GENERIC_FALLBACK",
            Self::NlpHeuristic => "NLP_HEURISTIC",
            Self::ModuleHeuristic => "MODULE_HEURISTIC",
            Self::ModuleRegex => "MODULE_REGEX",
            Self::FoundInSpecs => "FOUND_IN_SPECS",
            Self::DomainMapping => "DOMAIN_MAPPING",
            Self::OpenGraph => "OPEN_GRAPH",
            Self::JsonLd => "JSON_LD",
            Self::FoundInSharedContext => "FOUND_IN_SHARED_CONTEXT",
        }
    }
}

impl fmt::Display for FieldExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate value produced by a module (or a sub-key of its output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub value: Value,
    pub source: String,
    pub status: FieldExtractionStatus,
    pub score: i32,
}

impl ExtractionOutcome {
    pub fn found(
        value: impl Into<Value>,
        source: impl Into<String>,
        status: FieldExtractionStatus,
        score: i32,
    ) -> Self {
        Self {
            value: value.into(),
            source: source.into(),
            status,
            score,
        }
    }

    /// The canonical "nothing here" outcome: null value, NOT_FOUND, score 0
    pub fn not_found() -> Self {
        Self {
            value: Value::Null,
            source: "NOT_FOUND".to_string(),
            status: FieldExtractionStatus::NotFound,
            score: 0,
        }
    }

    pub fn is_found(&self) -> bool {
        !is_empty_value(&self.value)
    }
}

/// Null, blank strings, and empty arrays/objects all mean "not found"
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Returns the candidate with the highest score; on ties the first one wins.
///
/// `Iterator::max_by_key` keeps the *last* maximum, which would make ties
/// depend on append order the other way round, so the fold is explicit.
pub fn first_max_by_score<'a, I>(candidates: I) -> Option<&'a ExtractionOutcome>
where
    I: IntoIterator<Item = &'a ExtractionOutcome>,
{
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(current) if current.score >= candidate.score => Some(current),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_total_order() {
        use FieldExtractionStatus::*;
        let ordered = [
            NotFound,
            GenericFallback,
            NlpHeuristic,
            ModuleHeuristic,
            ModuleRegex,
            FoundInSpecs,
            DomainMapping,
            OpenGraph,
            JsonLd,
            FoundInSharedContext,
        ];

        for window in ordered.windows(2) {
            assert!(window[0] < window[1], "{} should rank below {}", window[0], window[1]);
        }
        assert_eq!(FoundInSharedContext.rank(), 9);
        assert!(JsonLd > OpenGraph);
    }

    #[test]
    fn test_status_serializes_as_screaming_snake() {
        let json = serde_json::to_string(&FieldExtractionStatus::FoundInSpecs).unwrap();
        assert_eq!(json, "\"FOUND_IN_SPECS\"");
    }

    #[test]
    fn test_not_found_outcome() {
        let outcome = ExtractionOutcome::not_found();
        assert!(!outcome.is_found());
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.status, FieldExtractionStatus::NotFound);
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("   ")));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!({})));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!("x")));
    }

    #[test]
    fn test_first_max_prefers_earliest_tie() {
        let outcomes = vec![
            ExtractionOutcome::found("a", "first", FieldExtractionStatus::JsonLd, 200),
            ExtractionOutcome::found("b", "second", FieldExtractionStatus::OpenGraph, 200),
            ExtractionOutcome::found("c", "third", FieldExtractionStatus::ModuleRegex, 50),
        ];

        let best = first_max_by_score(&outcomes).unwrap();
        assert_eq!(best.source, "first");
    }

    #[test]
    fn test_first_max_on_empty() {
        let outcomes: Vec<ExtractionOutcome> = Vec::new();
        assert!(first_max_by_score(&outcomes).is_none());
    }
}
