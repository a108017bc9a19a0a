// * Product price: an ordered chain, the first sub-parser that finds a price wins.
// * Structured data -> Open Graph -> itemprop -> price classes -> regex in sections -> regex in body.

use scraper::{Html, Selector};
use serde_json::json;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::support::{all_offers, element_text, og_value};
use crate::core::context::{DocumentKind, RequestContext};
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::patterns::PRICE_AMOUNT;
use crate::refinery::preprocess::body_text;
use crate::refinery::text::{clean_price_text, price_from_value};

static SELECTOR_ITEMPROP_PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemprop='price']").expect("Invalid itemprop selector"));
static SELECTOR_PRICE_CLASS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[class*='price']:not([class*='old']):not([class*='was']):not([class*='strike']), [id*='price']")
        .expect("Invalid price class selector")
});
static SELECTOR_PRODUCT_SECTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("main, [class*='product'], [id*='product']").expect("Invalid product section selector")
});

pub struct PriceModule;

type PriceParser = fn(&RequestContext) -> Option<(f64, String, FieldExtractionStatus, i32)>;

impl PriceModule {
    fn from_json_ld(ctx: &RequestContext) -> Option<(f64, String, FieldExtractionStatus, i32)> {
        all_offers(ctx).into_iter().find_map(|offer| {
            let raw = ["lowPrice", "price"]
                .iter()
                .find_map(|key| offer.get(*key).and_then(price_from_value))
                .or_else(|| {
                    let spec = offer.get("priceSpecification")?.as_object()?;
                    ["minPrice", "price"]
                        .iter()
                        .find_map(|key| spec.get(*key).and_then(price_from_value))
                })?;
            Some((raw, "json_ld.offers.price".to_string(), FieldExtractionStatus::JsonLd, 200))
        })
    }

    fn from_open_graph(ctx: &RequestContext) -> Option<(f64, String, FieldExtractionStatus, i32)> {
        let (key, raw) = og_value(ctx, &["price:amount", "product:price:amount"])?;
        let price = clean_price_text(&raw)?;
        Some((price, format!("og:{}", key), FieldExtractionStatus::OpenGraph, 190))
    }

    fn from_itemprop(ctx: &RequestContext) -> Option<(f64, String, FieldExtractionStatus, i32)> {
        ctx.raw_document().select(&SELECTOR_ITEMPROP_PRICE).find_map(|el| {
            if let Some(price) = el.value().attr("content").and_then(clean_price_text) {
                ctx.claim(DocumentKind::Raw, &el);
                return Some((
                    price,
                    "[itemprop='price'][content]".to_string(),
                    FieldExtractionStatus::ModuleHeuristic,
                    120,
                ));
            }
            let price = clean_price_text(&element_text(&el))?;
            ctx.claim(DocumentKind::Raw, &el);
            Some((price, "[itemprop='price']".to_string(), FieldExtractionStatus::ModuleHeuristic, 115))
        })
    }

    fn from_price_classes(ctx: &RequestContext) -> Option<(f64, String, FieldExtractionStatus, i32)> {
        let regex = ctx.regex(PRICE_AMOUNT)?;
        ctx.raw_document()
            .select(&SELECTOR_PRICE_CLASS)
            .filter(|el| !ctx.is_claimed(DocumentKind::Raw, el))
            .find_map(|el| {
                let text = element_text(&el);
                // * Short texts only: a container holding half the page is not a price label
                if text.chars().count() > 60 {
                    return None;
                }
                let amount = regex.find(&text)?;
                let price = clean_price_text(amount.as_str())?;
                ctx.claim(DocumentKind::Raw, &el);
                Some((price, "[class*='price']".to_string(), FieldExtractionStatus::ModuleHeuristic, 100))
            })
    }

    fn from_sections(ctx: &RequestContext) -> Option<(f64, String, FieldExtractionStatus, i32)> {
        let regex = ctx.regex(PRICE_AMOUNT)?;
        ctx.cleaned_document()
            .select(&SELECTOR_PRODUCT_SECTION)
            .find_map(|section| {
                let text = element_text(&section);
                let amount = regex.find(&text)?;
                clean_price_text(amount.as_str())
            })
            .map(|price| (price, "regex (product section)".to_string(), FieldExtractionStatus::ModuleRegex, 70))
    }

    fn from_body(ctx: &RequestContext) -> Option<(f64, String, FieldExtractionStatus, i32)> {
        let regex = ctx.regex(PRICE_AMOUNT)?;
        first_amount(regex, ctx.cleaned_document())
            .map(|price| (price, "regex (body)".to_string(), FieldExtractionStatus::ModuleRegex, 50))
    }
}

fn first_amount(regex: &regex::Regex, document: &Html) -> Option<f64> {
    let text = body_text(document);
    regex.find_iter(&text).find_map(|m| clean_price_text(m.as_str()))
}

impl ExtractorModule for PriceModule {
    fn name(&self) -> &'static str {
        "price"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld", "open_graph"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let chain: [PriceParser; 6] = [
            Self::from_json_ld,
            Self::from_open_graph,
            Self::from_itemprop,
            Self::from_price_classes,
            Self::from_sections,
            Self::from_body,
        ];

        for parser in chain {
            if let Some((price, source, status, score)) = parser(ctx) {
                info!(price, source = %source, score, "Price: Extracted");
                return Ok(ExtractionOutcome::found(json!(price), source, status, score));
            }
        }

        debug!("Price: No suitable price found");
        Ok(ExtractionOutcome::not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::json_ld::JsonLdModule;
    use crate::modules::open_graph::OpenGraphModule;
    use crate::modules::support::test_support::context_after;

    fn price_of(html: &str) -> ExtractionOutcome {
        let ctx = context_after(html, &[&JsonLdModule, &OpenGraphModule]);
        PriceModule.extract(&ctx).unwrap()
    }

    #[test]
    fn test_json_ld_offer_price() {
        let outcome = price_of(
            r#"<script type="application/ld+json">{"@type": "Product", "offers": {"@type": "Offer", "price": "19,99"}}</script>"#,
        );
        assert_eq!(outcome.value, json!(19.99));
        assert_eq!(outcome.source, "json_ld.offers.price");
        assert_eq!(outcome.score, 200);
    }

    #[test]
    fn test_price_specification_fallback() {
        let outcome = price_of(
            r#"<script type="application/ld+json">{"@type": "Product", "offers": [{"priceSpecification": {"price": 7.5}}]}</script>"#,
        );
        assert_eq!(outcome.value, json!(7.5));
    }

    #[test]
    fn test_open_graph_price() {
        let outcome = price_of(r#"<meta property="product:price:amount" content="1.299,00">"#);
        assert_eq!(outcome.value, json!(1299.0));
        assert_eq!(outcome.source, "og:product:price:amount");
        assert_eq!(outcome.score, 190);
    }

    #[test]
    fn test_itemprop_content_beats_classes() {
        let outcome = price_of(
            r#"<body><span class="price">€ 25,00</span><meta itemprop="price" content="24.95"></body>"#,
        );
        assert_eq!(outcome.value, json!(24.95));
        assert_eq!(outcome.score, 120);
    }

    #[test]
    fn test_price_class_skips_old_price() {
        let outcome = price_of(
            r#"<body><span class="price-old">€ 30,00</span><span class="price-now">€ 25,00</span></body>"#,
        );
        assert_eq!(outcome.value, json!(25.0));
        assert_eq!(outcome.score, 100);
    }

    #[test]
    fn test_product_section_regex() {
        let outcome = price_of("<body><main><p>Nu voor € 12,50</p></main></body>");
        assert_eq!(outcome.value, json!(12.5));
        assert_eq!(outcome.source, "regex (product section)");
        assert_eq!(outcome.score, 70);
    }

    #[test]
    fn test_body_regex_last_resort() {
        let outcome = price_of("<body><p>Nu slechts € 12,50 inclusief btw</p></body>");
        assert_eq!(outcome.value, json!(12.5));
        assert_eq!(outcome.status, FieldExtractionStatus::ModuleRegex);
    }

    #[test]
    fn test_no_price() {
        assert!(!price_of("<body><p>Geen prijs bekend</p></body>").is_found());
    }
}
