// * ISO 4217 currency code of the product price.

use regex::Regex;
use scraper::Selector;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::support::{all_offers, content_or_text, og_value};
use crate::core::context::RequestContext;
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::patterns::PRICE_AMOUNT;
use crate::refinery::preprocess::body_text;

static SELECTOR_ITEMPROP_CURRENCY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemprop='priceCurrency']").expect("Invalid itemprop selector")
});
static CURRENCY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"€|EUR|\$|USD|£|GBP|CHF").expect("Invalid currency regex"));

/// Symbol or code as it appears next to a price
fn code_for_marker(marker: &str) -> Option<&'static str> {
    match marker {
        "€" | "EUR" => Some("EUR"),
        "$" | "USD" => Some("USD"),
        "£" | "GBP" => Some("GBP"),
        "CHF" => Some("CHF"),
        _ => None,
    }
}

/// Three ASCII letters, upper-cased
fn valid_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())).then_some(code)
}

pub struct CurrencyModule;

impl CurrencyModule {
    fn from_json_ld(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        all_offers(ctx)
            .into_iter()
            .find_map(|offer| {
                offer
                    .get("priceCurrency")
                    .or_else(|| offer.get("priceSpecification")?.get("priceCurrency"))
                    .and_then(Value::as_str)
                    .and_then(valid_code)
            })
            .map(|code| {
                ExtractionOutcome::found(code, "json_ld.offers.priceCurrency", FieldExtractionStatus::JsonLd, 200)
            })
    }

    fn from_open_graph(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let (key, raw) = og_value(ctx, &["price:currency", "product:price:currency"])?;
        let code = valid_code(&raw)?;
        Some(ExtractionOutcome::found(code, format!("og:{}", key), FieldExtractionStatus::OpenGraph, 190))
    }

    fn from_itemprop(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_ITEMPROP_CURRENCY)
            .find_map(|el| valid_code(&content_or_text(&el)))
            .map(|code| {
                ExtractionOutcome::found(
                    code,
                    "[itemprop='priceCurrency']",
                    FieldExtractionStatus::ModuleHeuristic,
                    120,
                )
            })
    }

    /// Marker of the first price-looking amount in the body text
    fn from_symbol(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let amount = ctx.regex(PRICE_AMOUNT)?;
        let text = body_text(ctx.cleaned_document());
        amount
            .find_iter(&text)
            .find_map(|m| CURRENCY_MARKER.find(m.as_str()).and_then(|c| code_for_marker(c.as_str())))
            .map(|code| ExtractionOutcome::found(code, "regex (currency symbol)", FieldExtractionStatus::ModuleRegex, 60))
    }
}

impl ExtractorModule for CurrencyModule {
    fn name(&self) -> &'static str {
        "currency"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld", "open_graph"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let found = Self::from_json_ld(ctx)
            .or_else(|| Self::from_open_graph(ctx))
            .or_else(|| Self::from_itemprop(ctx))
            .or_else(|| Self::from_symbol(ctx));

        match found {
            Some(outcome) => {
                info!(currency = %outcome.value, source = %outcome.source, "Currency: Extracted");
                Ok(outcome)
            }
            None => {
                debug!("Currency: Not found");
                Ok(ExtractionOutcome::not_found())
            }
        }
    }
}
