// * Main product image as an absolute URL.
// * Structured sources are trusted on any http(s) URL; page heuristics also need an image extension.

use scraper::{ElementRef, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

use super::support::{og_value, product_nodes};
use crate::core::context::{DocumentKind, RequestContext};
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};

static SELECTOR_ITEMPROP_IMAGE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemprop='image'], link[rel='image_src']").expect("Invalid image meta selector")
});
static SELECTOR_PRODUCT_SECTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div[id*='product'], div[class*='product'], main, article")
        .expect("Invalid product section selector")
});
// * Amazon-style gallery elements, most specific first
static MARKETPLACE_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    [
        "#landingImage",
        "#imgTagWrapperId img",
        "#main-image-container img",
        "#mainImage",
        ".a-dynamic-image",
        "#imgBlkFront",
    ]
    .iter()
    .map(|css| (*css, Selector::parse(css).expect("Invalid marketplace image selector")))
    .collect()
});
static SELECTOR_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("Invalid img selector"));

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "avif"];
// * Section images known to be smaller than this (either side) are icons
const MIN_SECTION_SIDE: u32 = 50;
// * Fallback images need a declared area of at least 100x100
const MIN_FALLBACK_AREA: u32 = 10_000;

/// http(s) URL, optionally with a known image extension on its path
fn accept_url(resolved: &str, require_extension: bool) -> bool {
    let Ok(url) = Url::parse(resolved) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    if !require_extension {
        return true;
    }
    url.path()
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pixel dimension attribute, "600" or "600px"
fn dimension(img: &ElementRef, attr: &str) -> Option<u32> {
    let digits: String = img.value().attr(attr)?.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Image source, preferring lazy-loading attributes over placeholder `src`
fn img_source<'a>(img: &ElementRef<'a>) -> Option<&'a str> {
    ["data-src", "data-zoom-image", "src"]
        .iter()
        .find_map(|attr| img.value().attr(attr).filter(|v| !v.trim().is_empty()))
}

/// JSON-LD image value: a URL string, an ImageObject, or a list of either
fn json_ld_image(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.trim().to_string()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(json_ld_image),
        Value::Array(items) => items.iter().find_map(json_ld_image),
        _ => None,
    }
}

pub struct ImageModule;

impl ImageModule {
    fn from_json_ld(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        product_nodes(ctx)
            .into_iter()
            .filter_map(|node| node.get("image").and_then(json_ld_image))
            .filter_map(|raw| ctx.resolve_url(&raw))
            .find(|url| accept_url(url, false))
            .map(|url| ExtractionOutcome::found(url, "json_ld.image", FieldExtractionStatus::JsonLd, 200))
    }

    fn from_open_graph(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let (key, raw) = og_value(ctx, &["image", "image:url", "image:secure_url"])?;
        let url = ctx.resolve_url(&raw).filter(|url| accept_url(url, false))?;
        Some(ExtractionOutcome::found(url, format!("og:{}", key), FieldExtractionStatus::OpenGraph, 190))
    }

    fn from_itemprop(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_ITEMPROP_IMAGE)
            .filter(|el| !ctx.is_claimed(DocumentKind::Raw, el))
            .find_map(|el| {
                let attrs = el.value();
                let raw = attrs
                    .attr("content")
                    .or_else(|| attrs.attr("href"))
                    .or_else(|| img_source(&el))?;
                let url = ctx.resolve_url(raw).filter(|url| accept_url(url, true))?;
                ctx.claim(DocumentKind::Raw, &el);
                Some(url)
            })
            .map(|url| ExtractionOutcome::found(url, "[itemprop='image']", FieldExtractionStatus::ModuleHeuristic, 150))
    }

    /// Amazon-style main image; the high-resolution attribute wins over `src`
    fn from_marketplace(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        for (css, selector) in MARKETPLACE_SELECTORS.iter() {
            let Some(img) = ctx.raw_document().select(selector).next() else {
                continue;
            };
            let attrs = img.value();
            let Some(src) = attrs.attr("src").filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            if ctx.is_claimed(DocumentKind::Raw, &img) {
                continue;
            }

            let hires = attrs
                .attr("data-old-hires")
                .or_else(|| attrs.attr("data-a-image-src"))
                .and_then(|raw| ctx.resolve_url(raw))
                .filter(|url| accept_url(url, true));
            if let Some(url) = hires {
                ctx.claim(DocumentKind::Raw, &img);
                return Some(ExtractionOutcome::found(
                    url,
                    format!("{} (hires)", css),
                    FieldExtractionStatus::ModuleHeuristic,
                    180,
                ));
            }
            if let Some(url) = ctx.resolve_url(src).filter(|url| accept_url(url, true)) {
                ctx.claim(DocumentKind::Raw, &img);
                return Some(ExtractionOutcome::found(url, *css, FieldExtractionStatus::ModuleHeuristic, 175));
            }
        }
        None
    }

    /// First reasonably sized image inside a product section
    fn from_product_context(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_PRODUCT_SECTION)
            .flat_map(|section| section.select(&SELECTOR_IMG))
            .filter(|img| !ctx.is_claimed(DocumentKind::Raw, img))
            .find_map(|img| {
                if let (Some(w), Some(h)) = (dimension(&img, "width"), dimension(&img, "height")) {
                    if w < MIN_SECTION_SIDE || h < MIN_SECTION_SIDE {
                        debug!(width = w, height = h, "Image: Skipping small section image");
                        return None;
                    }
                }
                let url = img_source(&img)
                    .and_then(|raw| ctx.resolve_url(raw))
                    .filter(|url| accept_url(url, true))?;
                ctx.claim(DocumentKind::Raw, &img);
                Some(url)
            })
            .map(|url| {
                ExtractionOutcome::found(url, "img in product section", FieldExtractionStatus::ModuleHeuristic, 120)
            })
    }

    /// Largest image with declared dimensions; the earliest wins on equal area
    fn from_largest(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let mut best: Option<(u32, String)> = None;

        for img in ctx.raw_document().select(&SELECTOR_IMG) {
            if ctx.is_claimed(DocumentKind::Raw, &img) {
                continue;
            }
            let (Some(w), Some(h)) = (dimension(&img, "width"), dimension(&img, "height")) else {
                continue;
            };
            let area = w.saturating_mul(h);
            if area < MIN_FALLBACK_AREA || best.as_ref().is_some_and(|(max, _)| area <= *max) {
                continue;
            }
            if let Some(url) = img_source(&img)
                .and_then(|raw| ctx.resolve_url(raw))
                .filter(|url| accept_url(url, true))
            {
                best = Some((area, url));
            }
        }

        best.map(|(_, url)| ExtractionOutcome::found(url, "largest img", FieldExtractionStatus::GenericFallback, 50))
    }
}

impl ExtractorModule for ImageModule {
    fn name(&self) -> &'static str {
        "image"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld", "open_graph"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let found = Self::from_json_ld(ctx)
            .or_else(|| Self::from_open_graph(ctx))
            .or_else(|| Self::from_itemprop(ctx))
            .or_else(|| Self::from_marketplace(ctx))
            .or_else(|| Self::from_product_context(ctx))
            .or_else(|| Self::from_largest(ctx));

        match found {
            Some(outcome) => {
                info!(image = %outcome.value, source = %outcome.source, "Image: Extracted");
                Ok(outcome)
            }
            None => {
                debug!("Image: Not found");
                Ok(ExtractionOutcome::not_found())
            }
        }
    }
}
