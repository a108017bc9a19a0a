// * Product title: every sub-parser runs and the best-scored candidate wins.

use scraper::Selector;
use std::sync::LazyLock;
use tracing::debug;

use super::support::{as_text, best_of, content_or_text, element_text, og_value, product_nodes};
use crate::config::constants::MIN_TITLE_LENGTH;
use crate::core::context::{DocumentKind, RequestContext};
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::text::clean_title;

static SELECTOR_MARKETPLACE_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#productTitle").expect("Invalid product title selector"));
static SELECTOR_H1: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("Invalid h1 selector"));
static SELECTOR_TITLE_TAG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head > title").expect("Invalid title selector"));
static SELECTOR_ITEMPROP_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemprop='name']").expect("Invalid itemprop selector"));
static SELECTOR_FALLBACK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[class*='product-title'], [class*='product-name'], span[id*='title'], div[id*='title'], h2.title")
        .expect("Invalid title fallback selector")
});

pub struct TitleModule;

fn acceptable(title: &str) -> bool {
    title.chars().count() >= MIN_TITLE_LENGTH
}

impl TitleModule {
    fn from_json_ld(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        product_nodes(ctx)
            .into_iter()
            .find_map(|node| node.get("name").and_then(as_text))
            .map(|name| clean_title(&name))
            .filter(|name| acceptable(name))
            .map(|name| ExtractionOutcome::found(name, "json_ld.name", FieldExtractionStatus::JsonLd, 300))
    }

    fn from_open_graph(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        og_value(ctx, &["title"])
            .map(|(_, title)| clean_title(&title))
            .filter(|title| acceptable(title))
            .map(|title| ExtractionOutcome::found(title, "og:title", FieldExtractionStatus::OpenGraph, 275))
    }

    /// Amazon-style `#productTitle`; claimed so the h1 parser skips it
    fn from_marketplace_title(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let el = ctx.raw_document().select(&SELECTOR_MARKETPLACE_TITLE).next()?;
        let title = clean_title(&element_text(&el));
        if title.is_empty() {
            return None;
        }
        ctx.claim(DocumentKind::Raw, &el);
        Some(ExtractionOutcome::found(title, "#productTitle", FieldExtractionStatus::ModuleHeuristic, 250))
    }

    fn from_h1(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let h1 = ctx
            .raw_document()
            .select(&SELECTOR_H1)
            .filter(|h1| !ctx.is_claimed(DocumentKind::Raw, h1))
            .find(|h1| acceptable(&element_text(h1)))?;

        ctx.claim(DocumentKind::Raw, &h1);
        let title = clean_title(&element_text(&h1));
        Some(ExtractionOutcome::found(title, "h1", FieldExtractionStatus::ModuleHeuristic, 220))
    }

    fn from_title_tag(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_TITLE_TAG)
            .map(|tag| clean_title(&element_text(&tag)))
            .find(|title| acceptable(title))
            .map(|title| ExtractionOutcome::found(title, "<title>", FieldExtractionStatus::ModuleHeuristic, 180))
    }

    fn from_itemprop(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        ctx.raw_document()
            .select(&SELECTOR_ITEMPROP_NAME)
            .filter(|el| !ctx.is_claimed(DocumentKind::Raw, el))
            .map(|el| clean_title(&content_or_text(&el)))
            .find(|title| acceptable(title))
            .map(|title| {
                ExtractionOutcome::found(title, "[itemprop='name']", FieldExtractionStatus::ModuleHeuristic, 140)
            })
    }

    fn from_fallback(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        ctx.cleaned_document()
            .select(&SELECTOR_FALLBACK)
            .map(|el| clean_title(&element_text(&el)))
            .find(|title| (10..200).contains(&title.chars().count()))
            .map(|title| {
                ExtractionOutcome::found(title, "title fallback", FieldExtractionStatus::GenericFallback, 80)
            })
    }
}

impl ExtractorModule for TitleModule {
    fn name(&self) -> &'static str {
        "title"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld", "open_graph"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let candidates: Vec<ExtractionOutcome> = [
            Self::from_json_ld(ctx),
            Self::from_open_graph(ctx),
            Self::from_marketplace_title(ctx),
            Self::from_h1(ctx),
            Self::from_title_tag(ctx),
            Self::from_itemprop(ctx),
            Self::from_fallback(ctx),
        ]
        .into_iter()
        .flatten()
        .collect();

        debug!(candidates = candidates.len(), "Title: Candidates collected");
        Ok(best_of(candidates))
    }
}
