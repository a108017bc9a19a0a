// * Text normalisation helpers shared by the field modules.
// * Prices, availability states, EAN codes, titles, and whitespace.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static NON_PRICE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d.,]").expect("Invalid price cleanup regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));
static NON_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\D").expect("Invalid digit regex"));
// * " | Shop", " - Shop", " – Shop" style suffixes appended by most storefronts
static TITLE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[|\-–—:]\s+[^|\-–—:]{2,40}$").expect("Invalid title suffix regex"));

/// Schema.org availability states we accept verbatim
const SCHEMA_AVAILABILITY: [&str; 8] = [
    "InStock",
    "OutOfStock",
    "PreOrder",
    "LimitedAvailability",
    "Discontinued",
    "SoldOut",
    "OnlineOnly",
    "InStoreOnly",
];

/// Collapses whitespace runs (including nbsp) into single spaces
pub fn clean_text(text: &str) -> String {
    let replaced = text.replace('\u{a0}', " ");
    WHITESPACE_RUN.replace_all(replaced.trim(), " ").into_owned()
}

/// Parses a price string in European or US notation.
///
/// "1.234,56" -> 1234.56, "1,234.56" -> 1234.56, "19,99" -> 19.99, "€ 5" -> 5.0
pub fn clean_price_text(raw: &str) -> Option<f64> {
    let stripped = NON_PRICE_CHARS.replace_all(raw.trim(), "");
    let mut s = stripped.trim_matches(|c| c == '.' || c == ',').to_string();
    if s.is_empty() {
        return None;
    }

    match (s.rfind(','), s.rfind('.')) {
        // * 1.234,56 -> comma is the decimal separator
        (Some(comma), Some(dot)) if comma > dot => {
            s = s.replace('.', "").replace(',', ".");
        }
        // * 1,234.56 -> dot is the decimal separator
        (Some(_), Some(_)) => {
            s = s.replace(',', "");
        }
        // * 1,299 and 1,234,567 are thousands groups; 19,99 and 0,999 are decimals
        (Some(comma), None) => {
            let decimals = s.len() - comma - 1;
            let integer_part = &s[..s.find(',').unwrap_or(comma)];
            let grouped = s.matches(',').count() > 1
                || (decimals == 3 && !integer_part.trim_start_matches('0').is_empty());
            if grouped {
                s = s.replace(',', "");
            } else {
                s = s.replace(',', ".");
            }
        }
        _ => {}
    }

    // * Multiple dots left means dotted thousands without decimals (1.234.567)
    if s.matches('.').count() > 1 {
        s = s.replace('.', "");
    }

    s.parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0)
}

/// Accepts a JSON number or a string holding a price
pub fn price_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => clean_price_text(s),
        _ => None,
    }
}

/// Maps free-form availability text onto schema.org state names.
///
/// Keyword lists come from the pattern provider so both the request language
/// and the default language are honoured.
pub fn normalize_availability(
    raw: &str,
    in_stock: &[String],
    out_of_stock: &[String],
    preorder: &[String],
) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // * "https://schema.org/InStock" -> "InStock"
    let tail = trimmed.rsplit('/').next().unwrap_or(trimmed);
    if let Some(exact) = SCHEMA_AVAILABILITY
        .iter()
        .find(|state| state.eq_ignore_ascii_case(tail))
    {
        return Some(exact.to_string());
    }

    let lower = trimmed.to_lowercase();
    let compact: String = lower.chars().filter(|c| !c.is_whitespace() && *c != '_').collect();

    // * Negative phrases first: "not in stock" contains "in stock"
    if compact.contains("outofstock") || out_of_stock.iter().any(|k| lower.contains(k.as_str())) {
        return Some("OutOfStock".to_string());
    }
    if compact.contains("preorder") || preorder.iter().any(|k| lower.contains(k.as_str())) {
        return Some("PreOrder".to_string());
    }
    if compact.contains("instock") || in_stock.iter().any(|k| lower.contains(k.as_str())) {
        return Some("InStock".to_string());
    }

    None
}

/// Strips non-digits and pads to the nearest GTIN length
pub fn normalize_ean(candidate: &str) -> String {
    let digits = NON_DIGITS.replace_all(candidate.trim(), "").into_owned();
    match digits.len() {
        12 => format!("0{}", digits),
        9..=11 => format!("{:0>13}", digits),
        _ => digits,
    }
}

/// Validates a GTIN-8/12/13/14 check digit
pub fn is_valid_ean_checksum(candidate: &str) -> bool {
    let candidate = candidate.trim();
    let len = candidate.len();
    if ![8, 12, 13, 14].contains(&len) || !candidate.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    let check_digit = digits[len - 1];

    // * Weights alternate 3,1,3,... starting from the digit left of the check digit
    let sum: u32 = digits[..len - 1]
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();

    (10 - (sum % 10)) % 10 == check_digit
}

/// Cleans a page title and drops a trailing " | Site Name" segment
pub fn clean_title(raw: &str) -> String {
    let cleaned = clean_text(raw);
    let without_suffix = TITLE_SUFFIX.replace(&cleaned, "");
    let result = without_suffix.trim();
    if result.is_empty() {
        cleaned
    } else {
        result.to_string()
    }
}
