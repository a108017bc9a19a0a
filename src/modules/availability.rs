// * Stock state, normalised to schema.org names (InStock, OutOfStock, PreOrder, ...).

use scraper::Selector;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::support::{all_offers, as_text, element_text, og_value};
use crate::core::context::RequestContext;
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::patterns::{AVAILABILITY_IN_STOCK, AVAILABILITY_OUT_OF_STOCK, AVAILABILITY_PREORDER};
use crate::refinery::text::normalize_availability;

static SELECTOR_ITEMPROP: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemprop='availability']").expect("Invalid itemprop selector"));
static SELECTOR_INDICATOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "[class*='stock'], [class*='availability'], [class*='delivery'], [class*='voorraad'], [class*='levertijd']",
    )
    .expect("Invalid availability indicator selector")
});
static SELECTOR_META_NAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[name*='availability'][content]").expect("Invalid meta selector")
});
static SELECTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("Invalid title selector"));

// * Indicator texts longer than this are page copy, not a stock label
const MAX_INDICATOR_WORDS: usize = 10;
const MAX_INDICATORS: usize = 10;

/// Keyword lists for the page language, resolved once per run
struct Keywords {
    in_stock: Vec<String>,
    out_of_stock: Vec<String>,
    preorder: Vec<String>,
}

impl Keywords {
    fn for_context(ctx: &RequestContext) -> Self {
        Self {
            in_stock: ctx.keywords(AVAILABILITY_IN_STOCK),
            out_of_stock: ctx.keywords(AVAILABILITY_OUT_OF_STOCK),
            preorder: ctx.keywords(AVAILABILITY_PREORDER),
        }
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        normalize_availability(raw, &self.in_stock, &self.out_of_stock, &self.preorder)
    }

    /// Like `normalize`, but refuses long free text
    fn normalize_label(&self, raw: &str) -> Option<String> {
        if raw.split_whitespace().count() > MAX_INDICATOR_WORDS {
            return None;
        }
        self.normalize(raw)
    }
}

pub struct AvailabilityModule;

impl AvailabilityModule {
    fn from_json_ld(ctx: &RequestContext, keywords: &Keywords) -> Option<ExtractionOutcome> {
        all_offers(ctx)
            .into_iter()
            .find_map(|offer| offer.get("availability").and_then(as_text))
            .and_then(|raw| keywords.normalize(&raw))
            .map(|state| {
                ExtractionOutcome::found(state, "json_ld.offers.availability", FieldExtractionStatus::JsonLd, 200)
            })
    }

    /// The open_graph module has already normalised these values
    fn from_open_graph(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let (key, state) = og_value(ctx, &["availability", "product:availability"])?;
        Some(ExtractionOutcome::found(state, format!("og:{}", key), FieldExtractionStatus::OpenGraph, 190))
    }

    fn from_itemprop(ctx: &RequestContext, keywords: &Keywords) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_ITEMPROP)
            .find_map(|el| {
                let attrs = el.value();
                let raw = attrs
                    .attr("href")
                    .or_else(|| attrs.attr("content"))
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(&el));
                keywords.normalize_label(&raw)
            })
            .map(|state| {
                ExtractionOutcome::found(state, "[itemprop='availability']", FieldExtractionStatus::ModuleHeuristic, 180)
            })
    }

    fn from_indicators(ctx: &RequestContext, keywords: &Keywords) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_INDICATOR)
            .take(MAX_INDICATORS)
            .find_map(|el| {
                let text = element_text(&el);
                let text = if text.is_empty() {
                    el.value()
                        .attr("title")
                        .or_else(|| el.value().attr("value"))
                        .unwrap_or_default()
                        .to_string()
                } else {
                    text
                };
                keywords.normalize_label(&text).map(|state| (el.value().name().to_string(), state))
            })
            .map(|(tag, state)| {
                ExtractionOutcome::found(
                    state,
                    format!("{} (textual)", tag),
                    FieldExtractionStatus::ModuleHeuristic,
                    90,
                )
            })
    }

    fn from_meta_name(ctx: &RequestContext, keywords: &Keywords) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_META_NAME)
            .filter_map(|meta| meta.value().attr("content"))
            .find_map(|content| keywords.normalize_label(content))
            .map(|state| {
                ExtractionOutcome::found(state, "meta[name*='availability']", FieldExtractionStatus::ModuleHeuristic, 80)
            })
    }

    fn from_title(ctx: &RequestContext, keywords: &Keywords) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_TITLE)
            .next()
            .and_then(|title| keywords.normalize_label(&element_text(&title)))
            .map(|state| ExtractionOutcome::found(state, "<title>", FieldExtractionStatus::ModuleHeuristic, 50))
    }
}

impl ExtractorModule for AvailabilityModule {
    fn name(&self) -> &'static str {
        "availability"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld", "open_graph"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let keywords = Keywords::for_context(ctx);

        let found = Self::from_json_ld(ctx, &keywords)
            .or_else(|| Self::from_open_graph(ctx))
            .or_else(|| Self::from_itemprop(ctx, &keywords))
            .or_else(|| Self::from_indicators(ctx, &keywords))
            .or_else(|| Self::from_meta_name(ctx, &keywords))
            .or_else(|| Self::from_title(ctx, &keywords));

        match found {
            Some(outcome) => {
                info!(availability = %outcome.value, source = %outcome.source, score = outcome.score, "Availability: Extracted");
                Ok(outcome)
            }
            None => {
                debug!("Availability: No clear status found");
                Ok(ExtractionOutcome::not_found())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::json_ld::JsonLdModule;
    use crate::modules::open_graph::OpenGraphModule;
    use crate::modules::support::test_support::context_after;
    use serde_json::json;

    fn availability_of(html: &str) -> ExtractionOutcome {
        let ctx = context_after(html, &[&JsonLdModule, &OpenGraphModule]);
        AvailabilityModule.extract(&ctx).unwrap()
    }

    #[test]
    fn test_json_ld_schema_url() {
        let outcome = availability_of(
            r#"<script type="application/ld+json">{"@type": "Product", "offers": {"availability": "https://schema.org/OutOfStock"}}</script>"#,
        );
        assert_eq!(outcome.value, json!("OutOfStock"));
        assert_eq!(outcome.score, 200);
    }

    #[test]
    fn test_itemprop_link_href() {
        let outcome = availability_of(r#"<link itemprop="availability" href="http://schema.org/InStock">"#);
        assert_eq!(outcome.value, json!("InStock"));
        assert_eq!(outcome.score, 180);
    }

    #[test]
    fn test_textual_indicator() {
        let outcome = availability_of(r#"<div class="product-stock-label">Sold out</div>"#);
        assert_eq!(outcome.value, json!("OutOfStock"));
        assert_eq!(outcome.source, "div (textual)");
    }

    #[test]
    fn test_long_indicator_text_is_ignored() {
        let outcome = availability_of(
            r#"<div class="delivery-info">We deliver every order within two working days when it is in stock</div>"#,
        );
        assert!(!outcome.is_found());
    }

    #[test]
    fn test_title_last_resort() {
        let outcome = availability_of("<html><head><title>Drill - Pre-order now</title></head></html>");
        assert_eq!(outcome.value, json!("PreOrder"));
        assert_eq!(outcome.score, 50);
    }
}
