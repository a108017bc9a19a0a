// * Helpers shared by the built-in modules: JSON-LD and Open Graph lookups,
// * element text, and best-of selection over a module's own sub-parsers.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

use crate::core::context::RequestContext;
use crate::core::types::{first_max_by_score, ExtractionOutcome};
use crate::refinery::text::clean_text;

pub type JsonObject = Map<String, Value>;

/// Objects from the json_ld module's raw output
pub fn json_ld_nodes(ctx: &RequestContext) -> Vec<&JsonObject> {
    match ctx.output("json_ld") {
        Some(Value::Array(nodes)) => nodes.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

/// `@type` equals `wanted` (string or list form, case-insensitive)
pub fn has_type(node: &JsonObject, wanted: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case(wanted),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case(wanted)),
        _ => false,
    }
}

pub fn product_nodes(ctx: &RequestContext) -> Vec<&JsonObject> {
    json_ld_nodes(ctx)
        .into_iter()
        .filter(|node| has_type(node, "Product") || has_type(node, "ProductGroup"))
        .collect()
}

/// `offers` as a list of objects, whether given as one object or an array
pub fn offers(node: &JsonObject) -> Vec<&JsonObject> {
    match node.get("offers") {
        Some(Value::Object(offer)) => vec![offer],
        Some(Value::Array(list)) => list.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

/// Every offer on the page, from product nodes and stand-alone Offer nodes
pub fn all_offers(ctx: &RequestContext) -> Vec<&JsonObject> {
    let nodes = json_ld_nodes(ctx);
    let mut result: Vec<&JsonObject> = nodes.iter().flat_map(|node| offers(*node)).collect();
    result.extend(
        nodes
            .into_iter()
            .filter(|node| has_type(node, "Offer") || has_type(node, "AggregateOffer")),
    );
    result
}

/// Readable text from a JSON-LD value: strings, numbers, `{name}` objects, first list item
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let cleaned = clean_text(s);
            (!cleaned.is_empty()).then_some(cleaned)
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("name").and_then(as_text),
        Value::Array(items) => items.iter().find_map(as_text),
        _ => None,
    }
}

/// Open Graph value by key ("title", "price:amount", "product:brand", ...)
pub fn og_value(ctx: &RequestContext, keys: &[&str]) -> Option<(String, String)> {
    let Some(Value::Object(tags)) = ctx.output("open_graph") else {
        return None;
    };
    keys.iter().find_map(|key| {
        tags.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| (key.to_string(), v.to_string()))
    })
}

/// Whitespace-normalised text of an element
pub fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// `content` attribute if present, otherwise the element text
pub fn content_or_text(element: &ElementRef) -> String {
    element
        .value()
        .attr("content")
        .map(clean_text)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| element_text(element))
}

/// `content` of the first matching meta tag
pub fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(clean_text)
        .find(|content| !content.is_empty())
}

/// Highest-scored candidate (earliest on ties), or the not-found outcome
pub fn best_of(candidates: Vec<ExtractionOutcome>) -> ExtractionOutcome {
    first_max_by_score(&candidates)
        .cloned()
        .unwrap_or_else(ExtractionOutcome::not_found)
}
