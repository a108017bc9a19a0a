// * Product description: every sub-parser runs and the best-scored candidate wins.
// * Texts shorter than MIN_DESCRIPTION_LENGTH are never candidates.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use tracing::debug;

use super::support::{as_text, best_of, content_or_text, element_text, meta_content, og_value, product_nodes};
use crate::config::constants::MIN_DESCRIPTION_LENGTH;
use crate::core::context::{DocumentKind, RequestContext};
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::patterns::DESCRIPTION_HEADINGS;
use crate::refinery::text::clean_text;

static SELECTOR_ITEMPROP: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemprop='description']").expect("Invalid itemprop selector"));
static SELECTOR_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3, h4, strong").expect("Invalid heading selector"));
static SELECTOR_META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[name='description'][content]").expect("Invalid meta selector"));
static SELECTOR_PRODUCT_DESCRIPTION_ID: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#productDescription").expect("Invalid product description selector"));
static SELECTOR_FEATURE_BULLETS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#feature-bullets ul").expect("Invalid feature bullets selector"));
static SELECTOR_LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("Invalid li selector"));
static SELECTOR_ABOUT_ITEM: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#productOverview_feature_div .a-section.a-spacing-small").expect("Invalid overview selector")
});
static SELECTOR_PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("Invalid paragraph selector"));

// * Following siblings collected after a description heading
const MAX_SECTION_BLOCKS: usize = 5;

fn long_enough(text: &str) -> bool {
    text.chars().count() >= MIN_DESCRIPTION_LENGTH
}

pub struct DescriptionModule;

impl DescriptionModule {
    fn from_json_ld(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        product_nodes(ctx)
            .into_iter()
            .find_map(|node| node.get("description").and_then(as_text))
            .filter(|text| long_enough(text))
            .map(|text| ExtractionOutcome::found(text, "json_ld.description", FieldExtractionStatus::JsonLd, 300))
    }

    fn from_open_graph(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let (_, text) = og_value(ctx, &["description"])?;
        long_enough(&text)
            .then(|| ExtractionOutcome::found(text, "og:description", FieldExtractionStatus::OpenGraph, 275))
    }

    fn from_itemprop(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let el = ctx
            .raw_document()
            .select(&SELECTOR_ITEMPROP)
            .filter(|el| !ctx.is_claimed(DocumentKind::Raw, el))
            .find(|el| long_enough(&content_or_text(el)))?;
        ctx.claim(DocumentKind::Raw, &el);
        Some(ExtractionOutcome::found(
            content_or_text(&el),
            "[itemprop='description']",
            FieldExtractionStatus::ModuleHeuristic,
            175,
        ))
    }

    /// Amazon-style blocks: the description, then feature bullets, then "About this item"
    fn from_marketplace_sections(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let document = ctx.cleaned_document();

        let description = document
            .select(&SELECTOR_PRODUCT_DESCRIPTION_ID)
            .next()
            .map(|el| element_text(&el))
            .filter(|text| long_enough(text));
        if let Some(text) = description {
            return Some(ExtractionOutcome::found(text, "#productDescription", FieldExtractionStatus::ModuleHeuristic, 250));
        }

        let bullets = document.select(&SELECTOR_FEATURE_BULLETS).next().map(|list| {
            let items: Vec<String> = list
                .select(&SELECTOR_LIST_ITEM)
                .map(|li| element_text(&li))
                .filter(|item| !item.is_empty())
                .collect();
            items.join(" ")
        });
        if let Some(text) = bullets.filter(|text| long_enough(text)) {
            return Some(ExtractionOutcome::found(text, "#feature-bullets ul", FieldExtractionStatus::ModuleHeuristic, 220));
        }

        document
            .select(&SELECTOR_ABOUT_ITEM)
            .next()
            .map(|el| element_text(&el))
            .filter(|text| long_enough(text))
            .map(|text| {
                ExtractionOutcome::found(text, "#productOverview_feature_div", FieldExtractionStatus::ModuleHeuristic, 210)
            })
    }

    /// Text following a heading such as "Product description"
    fn from_section_heading(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        let headings = ctx.keywords(DESCRIPTION_HEADINGS);

        ctx.cleaned_document().select(&SELECTOR_HEADING).find_map(|heading| {
            let label = element_text(&heading).trim_end_matches(':').trim().to_lowercase();
            if !headings.iter().any(|h| *h == label) {
                return None;
            }
            let text = section_text(&heading);
            long_enough(&text).then(|| {
                ExtractionOutcome::found(
                    text,
                    format!("section heading ({})", label),
                    FieldExtractionStatus::ModuleHeuristic,
                    150,
                )
            })
        })
    }

    fn from_meta_description(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        meta_content(ctx.raw_document(), &SELECTOR_META_DESCRIPTION)
            .filter(|text| long_enough(text))
            .map(|text| {
                ExtractionOutcome::found(text, "meta[name='description']", FieldExtractionStatus::ModuleHeuristic, 100)
            })
    }

    /// Longest paragraph of the cleaned page; the first wins on equal length
    fn from_longest_paragraph(ctx: &RequestContext) -> Option<ExtractionOutcome> {
        ctx.cleaned_document()
            .select(&SELECTOR_PARAGRAPH)
            .map(|p| element_text(&p))
            .filter(|text| long_enough(text))
            .fold(None::<String>, |best, text| match best {
                Some(current) if current.chars().count() >= text.chars().count() => Some(current),
                _ => Some(text),
            })
            .map(|text| ExtractionOutcome::found(text, "longest paragraph", FieldExtractionStatus::GenericFallback, 80))
    }
}

/// Sibling blocks after a heading, stopping at the next heading
fn section_text(heading: &ElementRef) -> String {
    let mut parts = Vec::new();
    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        if matches!(sibling.value().name(), "h1" | "h2" | "h3" | "h4") || parts.len() >= MAX_SECTION_BLOCKS {
            break;
        }
        let text = element_text(&sibling);
        if !text.is_empty() {
            parts.push(text);
        }
    }
    clean_text(&parts.join(" "))
}

impl ExtractorModule for DescriptionModule {
    fn name(&self) -> &'static str {
        "description"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld", "open_graph"]
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let candidates: Vec<ExtractionOutcome> = [
            Self::from_json_ld(ctx),
            Self::from_open_graph(ctx),
            Self::from_marketplace_sections(ctx),
            Self::from_itemprop(ctx),
            Self::from_section_heading(ctx),
            Self::from_meta_description(ctx),
            Self::from_longest_paragraph(ctx),
        ]
        .into_iter()
        .flatten()
        .collect();

        debug!(candidates = candidates.len(), "Description: Candidates collected");
        Ok(best_of(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::json_ld::JsonLdModule;
    use crate::modules::open_graph::OpenGraphModule;
    use crate::modules::support::test_support::context_after;
    use serde_json::json;

    const LONG: &str = "A powerful cordless drill with two batteries and a sturdy carrying case.";

    fn description_of(html: &str) -> ExtractionOutcome {
        let ctx = context_after(html, &[&JsonLdModule, &OpenGraphModule]);
        DescriptionModule.extract(&ctx).unwrap()
    }

    #[test]
    fn test_open_graph_beats_meta_description() {
        let html = format!(
            r#"<head><meta name="description" content="{LONG} Meta."><meta property="og:description" content="{LONG}"></head>"#
        );
        let outcome = description_of(&html);
        assert_eq!(outcome.value, json!(LONG));
        assert_eq!(outcome.score, 275);
    }

    #[test]
    fn test_short_structured_description_is_ignored() {
        let html = format!(
            r#"<script type="application/ld+json">{{"@type": "Product", "description": "Drill"}}</script><body><p>{LONG}</p></body>"#
        );
        let outcome = description_of(&html);
        assert_eq!(outcome.value, json!(LONG));
        assert_eq!(outcome.source, "longest paragraph");
    }

    #[test]
    fn test_section_after_heading() {
        let html = format!(
            r#"<body><div><h2>Product description</h2><p>{LONG}</p><p>Includes charger.</p><h2>Reviews</h2><p>Great!</p></div></body>"#
        );
        let outcome = description_of(&html);
        assert_eq!(outcome.value, json!(format!("{LONG} Includes charger.")));
        assert_eq!(outcome.score, 150);
    }

    #[test]
    fn test_product_description_block_beats_meta() {
        let html = format!(
            r#"<head><meta name="description" content="{LONG} Order today."></head>
               <body><div id="productDescription"><p>{LONG}</p></div></body>"#
        );
        let outcome = description_of(&html);
        assert_eq!(outcome.value, json!(LONG));
        assert_eq!(outcome.source, "#productDescription");
        assert_eq!(outcome.score, 250);
    }

    #[test]
    fn test_feature_bullets_joined() {
        let html = r#"<body><div id="feature-bullets"><ul>
                <li><span>Brushless motor with 60 Nm of torque</span></li>
                <li><span>Two 18V batteries and a fast charger included</span></li>
                <li></li>
            </ul></div></body>"#;
        let outcome = description_of(html);
        assert_eq!(
            outcome.value,
            json!("Brushless motor with 60 Nm of torque Two 18V batteries and a fast charger included")
        );
        assert_eq!(outcome.score, 220);
    }

    #[test]
    fn test_nothing_long_enough() {
        assert!(!description_of("<body><p>Too short.</p></body>").is_found());
    }
}
