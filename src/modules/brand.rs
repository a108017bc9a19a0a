// * Brand name. Structured data first, then a labelled value in the page
// * ("Merk: Acme", "<th>Brand</th><td>Acme</td>"), then patterns in the
// * product title, and finally brand-classed elements confirmed by the title.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::support::{as_text, content_or_text, element_text, og_value, product_nodes};
use crate::core::context::{DocumentKind, RequestContext};
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::patterns::{BRAND_LABELS, GENERIC_BRAND_TEXT};

static SELECTOR_ITEMPROP_BRAND: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemprop='brand'], [itemprop='manufacturer']").expect("Invalid itemprop selector")
});
static NAME_INSIDE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemprop='name']").expect("Invalid itemprop selector"));
static SELECTOR_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, dt, span, strong, b, label, td").expect("Invalid label selector"));

// * Main product title, most specific first; <title> when no heading matches
static TITLE_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    ["h1[itemprop='name']", "h1.product-title", "h1.item-name", "h1.product__title", "h1.pdp-title", "h1", "title"]
        .iter()
        .map(|css| (*css, Selector::parse(css).expect("Invalid main title selector")))
        .collect()
});
static SELECTOR_EXPLICIT_BRAND: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemprop='brand'], [class*='brand'], [class*='manufacturer'], [class*='vendor']")
        .expect("Invalid explicit brand selector")
});
static SELECTOR_BRAND_CLASS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "a[class*='brand'], span[class*='brand'], div[class*='brand'], p[class*='brand'], \
         a[class*='manufacturer'], span[class*='manufacturer'], div[class*='manufacturer'], p[class*='manufacturer']",
    )
    .expect("Invalid brand class selector")
});
static BRAND_DASH_PRODUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*[-–—]\s*(.+)").expect("Invalid brand title regex"));
static PRODUCT_PAREN_BRAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)$").expect("Invalid brand title regex"));
static MODEL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:[A-Z0-9]+[-./]?[A-Z0-9]+)+$").expect("Invalid model number regex"));
static NAVIGATION_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"filter|list|nav|menu|category").expect("Invalid navigation regex"));

const MAX_BRAND_LENGTH: usize = 50;
const MAX_BRAND_WORDS: usize = 4;
// * Brand-classed elements inspected by the last-resort parser
const MAX_FALLBACK_ELEMENTS: usize = 5;

// * Words that are never a brand on their own
const GENERIC_WORDS: [&str; 35] = [
    "the", "a", "an", "and", "or", "for", "with", "plus", "pro", "max", "mini", "ultra", "lite", "premium",
    "standard", "original", "official", "generic", "compatible", "universal", "charger", "adapter", "cable",
    "power", "output", "input", "watt", "volt", "amp", "store", "website", "visit", "page", "product", "brand",
];

/// Letters mixed with digits in one token ("XR-500", "B0C1"), not a brand
fn looks_like_model_number(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit()) && text.chars().any(char::is_alphabetic) && MODEL_NUMBER.is_match(text)
}

fn plausible(brand: &str) -> bool {
    let brand = brand.trim();
    let len = brand.chars().count();
    (2..=MAX_BRAND_LENGTH).contains(&len)
        && !looks_like_model_number(brand)
        && !brand.chars().all(|c| c.is_ascii_digit())
        && !GENERIC_WORDS.contains(&brand.to_lowercase().as_str())
        && brand.split_whitespace().count() <= MAX_BRAND_WORDS
}

/// Text and selector of the main product title
fn main_title(document: &Html) -> Option<(String, &'static str)> {
    TITLE_SELECTORS.iter().find_map(|(css, selector)| {
        let text = document.select(selector).next().map(|el| element_text(&el))?;
        (!text.is_empty()).then_some((text, *css))
    })
}

/// Lowercased texts of elements explicitly marked as a brand
fn explicit_brands(document: &Html) -> HashSet<String> {
    document
        .select(&SELECTOR_EXPLICIT_BRAND)
        .map(|el| content_or_text(&el).to_lowercase())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Whole-word, case-insensitive occurrence of `brand` in `title`
fn mentioned_in(title: &str, brand: &str) -> bool {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(brand)))
        .map(|re| re.is_match(title))
        .unwrap_or(false)
}

pub struct BrandModule;

impl BrandModule {
    fn from_json_ld(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        product_nodes(ctx)
            .into_iter()
            .find_map(|node| {
                ["brand", "manufacturer"]
                    .iter()
                    .find_map(|key| node.get(*key).and_then(as_text).map(|brand| (*key, brand)))
            })
            .filter(|(_, brand)| plausible(brand))
            .map(|(key, brand)| {
                ExtractionOutcome::found(brand, format!("json_ld.{}", key), FieldExtractionStatus::JsonLd, 250)
            })
    }

    fn from_open_graph(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let (key, brand) = og_value(ctx, &["brand", "product:brand"])?;
        plausible(&brand)
            .then(|| ExtractionOutcome::found(brand, format!("og:{}", key), FieldExtractionStatus::OpenGraph, 190))
    }

    fn from_itemprop(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_ITEMPROP_BRAND)
            .find_map(|el| {
                // * itemprop="brand" may wrap a Brand item with its own itemprop="name"
                let brand = el
                    .select(&NAME_INSIDE)
                    .next()
                    .map(|name| content_or_text(&name))
                    .unwrap_or_else(|| content_or_text(&el));
                plausible(&brand).then(|| {
                    ctx.claim(DocumentKind::Raw, &el);
                    brand
                })
            })
            .map(|brand| {
                ExtractionOutcome::found(brand, "[itemprop='brand']", FieldExtractionStatus::ModuleHeuristic, 175)
            })
    }

    /// Element whose text is a brand label, value taken from the next sibling element
    /// or from the text after the colon
    fn from_label(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let labels = ctx.keywords(BRAND_LABELS);
        if labels.is_empty() {
            return None;
        }

        ctx.raw_document()
            .select(&SELECTOR_LABEL)
            .filter(|el| !ctx.is_claimed(DocumentKind::Raw, el))
            .find_map(|el| {
                let text = element_text(&el);
                let (label, rest) = match text.split_once(':') {
                    Some((label, rest)) => (label.trim().to_lowercase(), rest.trim().to_string()),
                    None => (text.trim().to_lowercase(), String::new()),
                };
                if !labels.iter().any(|l| *l == label) {
                    return None;
                }

                let value = if !rest.is_empty() {
                    rest
                } else {
                    next_element_sibling(&el).map(|sibling| element_text(&sibling))?
                };
                plausible(&value).then_some(value)
            })
            .map(|brand| ExtractionOutcome::found(brand, "label + sibling", FieldExtractionStatus::ModuleHeuristic, 120))
    }

    /// Brand patterns in the main title. A title phrase that matches an explicitly
    /// marked brand on the page wins; otherwise "Brand - Product" and "Product (Brand)".
    fn from_title(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let (title, selector) = main_title(ctx.raw_document())?;

        let explicit = explicit_brands(ctx.raw_document());
        if !explicit.is_empty() {
            let words: Vec<&str> = title.split(' ').collect();
            // * Longest phrase first, so "Douwe Egberts" beats "Douwe"
            for len in (1..=words.len()).rev() {
                for window in words.windows(len) {
                    let phrase = window.join(" ");
                    let phrase = phrase.trim().trim_matches(|c: char| ".,;:|()[]{}".contains(c));
                    if !phrase.is_empty() && explicit.contains(&phrase.to_lowercase()) && plausible(phrase) {
                        return Some(ExtractionOutcome::found(
                            phrase,
                            format!("{} (n-gram match)", selector),
                            FieldExtractionStatus::ModuleHeuristic,
                            110,
                        ));
                    }
                }
            }
        }

        if let Some(caps) = BRAND_DASH_PRODUCT.captures(&title) {
            let brand = caps[1].trim();
            if plausible(brand) {
                return Some(ExtractionOutcome::found(
                    brand,
                    format!("{} (pattern \"Brand - Product\")", selector),
                    FieldExtractionStatus::ModuleHeuristic,
                    100,
                ));
            }
        }

        let caps = PRODUCT_PAREN_BRAND.captures(&title)?;
        let brand = caps[1].trim();
        plausible(brand).then(|| {
            ExtractionOutcome::found(
                brand,
                format!("{} (pattern \"Product (Brand)\")", selector),
                FieldExtractionStatus::ModuleHeuristic,
                95,
            )
        })
    }

    /// Last resort: a brand-classed element whose text also appears in the main title
    fn from_brand_class(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let (title, _) = main_title(ctx.raw_document())?;
        let generic = ctx.keywords(GENERIC_BRAND_TEXT);

        ctx.raw_document()
            .select(&SELECTOR_BRAND_CLASS)
            .take(MAX_FALLBACK_ELEMENTS)
            .find_map(|el| {
                let text = element_text(&el);
                let lower = text.to_lowercase();
                if generic.iter().any(|g| lower.contains(g.as_str())) {
                    return None;
                }

                let attrs = el.value();
                let marker = format!("{} {}", attrs.attr("class").unwrap_or_default(), attrs.attr("id").unwrap_or_default());
                if NAVIGATION_ATTR.is_match(&marker.to_lowercase()) {
                    return None;
                }
                if !plausible(&text) || !mentioned_in(&title, &text) {
                    return None;
                }

                let classes: Vec<&str> = attrs.classes().collect();
                let selector = if classes.is_empty() {
                    attrs.name().to_string()
                } else {
                    format!("{}.{}", attrs.name(), classes.join("."))
                };
                Some(ExtractionOutcome::found(
                    text,
                    format!("{} (fallback)", selector),
                    FieldExtractionStatus::ModuleHeuristic,
                    70,
                ))
            })
    }
}

fn next_element_sibling<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

impl ExtractorModule for BrandModule {
    fn name(&self) -> &'static str {
        "brand"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld", "open_graph"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let found = Self::from_json_ld(ctx)
            .or_else(|| Self::from_open_graph(ctx))
            .or_else(|| Self::from_itemprop(ctx))
            .or_else(|| Self::from_label(ctx))
            .or_else(|| Self::from_title(ctx))
            .or_else(|| Self::from_brand_class(ctx));

        match found {
            Some(outcome) => {
                info!(brand = %outcome.value, source = %outcome.source, "Brand: Extracted");
                Ok(outcome)
            }
            None => {
                debug!("Brand: Not found");
                Ok(ExtractionOutcome::not_found())
            }
        }
    }
}
