// * Category path of the product, as an ordered list of crumb labels.

use regex::Regex;
use scraper::{ElementRef, Node, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::support::{as_text, element_text, has_type, json_ld_nodes, JsonObject};
use crate::config::constants::{MAX_BREADCRUMBS, MAX_BREADCRUMB_LENGTH, MIN_BREADCRUMBS};
use crate::core::context::RequestContext;
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::patterns::BREADCRUMB_FILTER;
use crate::refinery::text::clean_text;

static SELECTOR_ITEMPROP_LIST: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemtype*='BreadcrumbList'] [itemprop='itemListElement']").expect("Invalid itemprop selector")
});
static SELECTOR_ITEMPROP_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemprop='name']").expect("Invalid itemprop selector"));
static SELECTOR_CONTAINER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("nav[aria-label*='readcrumb'], [class*='breadcrumb'], [id*='breadcrumb']")
        .expect("Invalid breadcrumb container selector")
});
static SELECTOR_LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("Invalid li selector"));
static SELECTOR_LINK_OR_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a, span").expect("Invalid link selector"));
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:>|»|/|\||\\)\s*").expect("Invalid separator regex"));
// * Postcodes, dates, and contact details share separators with crumb trails
static UNWANTED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d{4}\s*[a-z]{2}\b|\d{2}-\d{2}-\d{4}|email|tel:|fax:").expect("Invalid unwanted text regex")
});

const SKIPPED_PARENTS: [&str; 8] = ["script", "style", "title", "head", "a", "option", "noscript", "template"];

/// Trims, drops filler crumbs and consecutive duplicates, then checks count and length bounds
fn validate(crumbs: Vec<String>, filter: &[String]) -> Option<Vec<String>> {
    let mut result: Vec<String> = Vec::new();
    for crumb in crumbs {
        let crumb = clean_text(&crumb);
        if crumb.is_empty() || filter.iter().any(|f| f.eq_ignore_ascii_case(&crumb)) {
            continue;
        }
        if result.last() != Some(&crumb) {
            result.push(crumb);
        }
    }

    let within_bounds = (MIN_BREADCRUMBS..=MAX_BREADCRUMBS).contains(&result.len())
        && result.iter().all(|c| c.chars().count() <= MAX_BREADCRUMB_LENGTH);
    if within_bounds {
        Some(result)
    } else {
        debug!(crumbs = ?result, "Breadcrumbs: Rejected candidate list");
        None
    }
}

fn list_item_name(item: &JsonObject) -> Option<String> {
    item.get("name")
        .and_then(as_text)
        .or_else(|| item.get("item").and_then(Value::as_object)?.get("name").and_then(as_text))
}

pub struct BreadcrumbsModule;

impl BreadcrumbsModule {
    fn from_json_ld(ctx: &RequestContext, filter: &[String]) -> Option<ExtractionOutcome> {
        json_ld_nodes(ctx)
            .into_iter()
            .filter(|node| has_type(node, "BreadcrumbList"))
            .find_map(|node| {
                let mut items: Vec<(i64, String)> = node
                    .get("itemListElement")?
                    .as_array()?
                    .iter()
                    .filter_map(Value::as_object)
                    .enumerate()
                    .filter_map(|(index, item)| {
                        let position = item.get("position").and_then(Value::as_i64).unwrap_or(index as i64);
                        list_item_name(item).map(|name| (position, name))
                    })
                    .collect();
                items.sort_by_key(|(position, _)| *position);
                validate(items.into_iter().map(|(_, name)| name).collect(), filter)
            })
            .map(|crumbs| {
                ExtractionOutcome::found(crumbs, "json_ld.BreadcrumbList", FieldExtractionStatus::JsonLd, 150)
            })
    }

    fn from_itemprop(ctx: &RequestContext, filter: &[String]) -> Option<ExtractionOutcome> {
        let crumbs: Vec<String> = ctx
            .raw_document()
            .select(&SELECTOR_ITEMPROP_LIST)
            .map(|item| {
                item.select(&SELECTOR_ITEMPROP_NAME)
                    .next()
                    .map(|name| element_text(&name))
                    .unwrap_or_else(|| element_text(&item))
            })
            .collect();

        validate(crumbs, filter).map(|crumbs| {
            ExtractionOutcome::found(
                crumbs,
                "[itemprop='itemListElement']",
                FieldExtractionStatus::ModuleHeuristic,
                120,
            )
        })
    }

    /// Breadcrumb-looking containers: list items when present, otherwise links and spans
    fn from_container(ctx: &RequestContext, filter: &[String]) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_CONTAINER)
            .find_map(|container| {
                let mut crumbs: Vec<String> =
                    container.select(&SELECTOR_LIST_ITEM).map(|li| element_text(&li)).collect();
                if crumbs.is_empty() {
                    crumbs = container
                        .select(&SELECTOR_LINK_OR_SPAN)
                        .map(|el| element_text(&el))
                        .filter(|text| !SEPARATOR.replace_all(text, "").trim().is_empty())
                        .collect();
                }
                validate(crumbs, filter)
            })
            .map(|crumbs| {
                ExtractionOutcome::found(crumbs, "[class*='breadcrumb']", FieldExtractionStatus::ModuleHeuristic, 100)
            })
    }

    /// Plain text like "Home > Tools > Drills" split on common separators
    fn from_separators(ctx: &RequestContext, filter: &[String]) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .root_element()
            .descendants()
            .filter_map(|node| {
                let Node::Text(text) = node.value() else {
                    return None;
                };
                let parent = node.parent().and_then(ElementRef::wrap)?;
                if SKIPPED_PARENTS.contains(&parent.value().name()) {
                    return None;
                }
                let text = clean_text(text);
                let plausible = text.chars().count() >= 5 && SEPARATOR.is_match(&text) && !UNWANTED_TEXT.is_match(&text);
                plausible.then(|| (parent.value().name().to_string(), text))
            })
            .find_map(|(tag, text)| {
                let parts: Vec<String> = SEPARATOR.split(&text).map(str::to_string).collect();
                validate(parts, filter).map(|crumbs| (tag, crumbs))
            })
            .map(|(tag, crumbs)| {
                ExtractionOutcome::found(crumbs, format!("{} (text pattern)", tag), FieldExtractionStatus::ModuleRegex, 80)
            })
    }
}

impl ExtractorModule for BreadcrumbsModule {
    fn name(&self) -> &'static str {
        "breadcrumbs"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let filter = ctx.keywords(BREADCRUMB_FILTER);

        let found = Self::from_json_ld(ctx, &filter)
            .or_else(|| Self::from_itemprop(ctx, &filter))
            .or_else(|| Self::from_container(ctx, &filter))
            .or_else(|| Self::from_separators(ctx, &filter));

        match found {
            Some(outcome) => {
                info!(crumbs = %outcome.value, source = %outcome.source, "Breadcrumbs: Extracted");
                Ok(outcome)
            }
            None => {
                debug!("Breadcrumbs: Not found");
                Ok(ExtractionOutcome::not_found())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::json_ld::JsonLdModule;
    use crate::modules::support::test_support::context_after;
    use serde_json::json;

    fn crumbs_of(html: &str) -> ExtractionOutcome {
        let ctx = context_after(html, &[&JsonLdModule]);
        BreadcrumbsModule.extract(&ctx).unwrap()
    }

    #[test]
    fn test_json_ld_sorted_by_position() {
        let outcome = crumbs_of(
            r#"<script type="application/ld+json">{"@type": "BreadcrumbList", "itemListElement": [
                {"position": 3, "name": "Drills"},
                {"position": 1, "name": "Home"},
                {"position": 2, "item": {"@id": "/tools", "name": "Tools"}}
            ]}</script>"#,
        );
        assert_eq!(outcome.value, json!(["Tools", "Drills"]));
        assert_eq!(outcome.score, 150);
    }

    #[test]
    fn test_container_list_items() {
        let outcome = crumbs_of(
            r#"<nav class="breadcrumbs"><ol><li><a href="/">Home</a></li><li>Tools</li><li>Tools</li><li>Drills</li></ol></nav>"#,
        );
        assert_eq!(outcome.value, json!(["Tools", "Drills"]));
        assert_eq!(outcome.score, 100);
    }

    #[test]
    fn test_separator_text() {
        let outcome = crumbs_of("<body><div>Garden » Tools » Cordless drills</div></body>");
        assert_eq!(outcome.value, json!(["Garden", "Tools", "Cordless drills"]));
        assert_eq!(outcome.source, "div (text pattern)");
    }

    #[test]
    fn test_single_crumb_rejected() {
        assert!(!crumbs_of(r#"<div class="breadcrumb"><span>Drills</span></div>"#).is_found());
    }

    #[test]
    fn test_validate_length_bounds() {
        let long = "x".repeat(MAX_BREADCRUMB_LENGTH + 1);
        assert!(validate(vec!["A".into(), long], &[]).is_none());
        let many: Vec<String> = (0..=MAX_BREADCRUMBS).map(|i| format!("c{}", i)).collect();
        assert!(validate(many, &[]).is_none());
    }
}
