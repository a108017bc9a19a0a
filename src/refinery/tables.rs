// * Specification table extraction.
// * Heuristic scoring separates key/value property tables from layout tables,
// * then rows (or <dl> term/definition pairs) are read as ordered key/value lists.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::text::clean_text;

static SELECTOR_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("Invalid table selector"));
static SELECTOR_TBODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody").expect("Invalid tbody selector"));
static SELECTOR_TR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("Invalid tr selector"));
static SELECTOR_CAPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("Invalid caption selector"));
static SELECTOR_DL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dl").expect("Invalid dl selector"));

// * Key/value majority (3) is enough on its own; a layout signal pulls it below
const SPEC_TABLE_THRESHOLD: i32 = 3;

// * Group name used when a table has no caption
pub const DEFAULT_CATEGORY: &str = "General";

/// One block of product properties, in document order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecificationTable {
    pub category: String,
    pub rows: Vec<(String, String)>,
    pub score: i32,
}

/// Scores and reads key/value specification tables
pub struct TableScorer;

impl TableScorer {
    /// Heuristic score for a table element:
    /// - +3 when at least half the rows have exactly two non-empty cells
    /// - +2 for rows that open with a `th` label cell
    /// - +1 for tbody presence
    /// - -3 for nested tables (layout indicator)
    /// - -3 for role="presentation" or role="none"
    pub fn calculate_score(table: &ElementRef) -> i32 {
        let rows: Vec<ElementRef> = table.select(&SELECTOR_TR).collect();
        if rows.is_empty() {
            return 0;
        }

        let mut score: i32 = 0;

        let pair_rows = rows
            .iter()
            .filter(|row| {
                let cells = row_cells(row);
                cells.len() == 2 && cells.iter().all(|(_, text)| !text.is_empty())
            })
            .count();
        if pair_rows * 2 >= rows.len() {
            score += 3;
        }

        let labelled_rows = rows
            .iter()
            .filter(|row| {
                let cells = row_cells(row);
                matches!(cells.as_slice(), [(true, _), (false, _)])
            })
            .count();
        if labelled_rows > 0 {
            score += 2;
        }

        if table.select(&SELECTOR_TBODY).next().is_some() {
            score += 1;
        }

        // * Skip self, only nested tables count
        if table.select(&SELECTOR_TABLE).nth(1).is_some() {
            score -= 3;
        }

        if let Some(role) = table.value().attr("role") {
            let role_lower = role.to_lowercase();
            if role_lower == "presentation" || role_lower == "none" {
                score -= 3;
            }
        }

        score
    }

    pub fn is_spec_table(table: &ElementRef) -> bool {
        Self::calculate_score(table) >= SPEC_TABLE_THRESHOLD
    }

    /// Two-cell rows as (key, value); other rows are skipped
    pub fn key_value_rows(table: &ElementRef) -> Vec<(String, String)> {
        table
            .select(&SELECTOR_TR)
            .filter_map(|row| match row_cells(&row).as_slice() {
                [(_, key), (_, value)] if !key.is_empty() && !value.is_empty() => {
                    Some((key.trim_end_matches(':').trim().to_string(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Every specification table in the document with at least one row
    pub fn extract_tables(document: &Html) -> Vec<SpecificationTable> {
        document
            .select(&SELECTOR_TABLE)
            .filter(Self::is_spec_table)
            .filter_map(|table| {
                let rows = Self::key_value_rows(&table);
                if rows.is_empty() {
                    return None;
                }
                let category = table
                    .select(&SELECTOR_CAPTION)
                    .next()
                    .map(|caption| clean_text(&caption.text().collect::<String>()))
                    .filter(|caption| !caption.is_empty())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

                Some(SpecificationTable {
                    category,
                    rows,
                    score: Self::calculate_score(&table),
                })
            })
            .collect()
    }

    /// `<dl>` lists read as dt -> dd pairs; a dd without a pending dt is ignored
    pub fn extract_definition_lists(document: &Html) -> Vec<SpecificationTable> {
        document
            .select(&SELECTOR_DL)
            .filter_map(|dl| {
                let mut rows = Vec::new();
                let mut pending_key: Option<String> = None;

                for child in dl.children().filter_map(ElementRef::wrap) {
                    let text = clean_text(&child.text().collect::<String>());
                    match child.value().name() {
                        "dt" => pending_key = Some(text.trim_end_matches(':').trim().to_string()),
                        "dd" => {
                            if let Some(key) = pending_key.take() {
                                if !key.is_empty() && !text.is_empty() {
                                    rows.push((key, text));
                                }
                            }
                        }
                        _ => {}
                    }
                }

                (!rows.is_empty()).then(|| SpecificationTable {
                    category: DEFAULT_CATEGORY.to_string(),
                    rows,
                    score: SPEC_TABLE_THRESHOLD,
                })
            })
            .collect()
    }
}

/// Direct th/td children of a row as (is_header, cleaned text)
fn row_cells(row: &ElementRef) -> Vec<(bool, String)> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter_map(|cell| match cell.value().name() {
            "th" => Some((true, clean_text(&cell.text().collect::<String>()))),
            "td" => Some((false, clean_text(&cell.text().collect::<String>()))),
            _ => None,
        })
        .collect()
}
