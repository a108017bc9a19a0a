// * Open Graph provider: `og:*` and `product:*` meta tags as one keyed map.
// * Keys lose their `og:` prefix, so "title", "image", "description", and
// * "availability" fan out to the matching fields directly. Price tags are
// * also exposed as a parsed "price" and "currency".

use scraper::Selector;
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::core::context::RequestContext;
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::patterns::{AVAILABILITY_IN_STOCK, AVAILABILITY_OUT_OF_STOCK, AVAILABILITY_PREORDER};
use crate::refinery::text::{clean_price_text, clean_text, normalize_availability};

static SELECTOR_PROPERTY_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property][content]").expect("Invalid meta selector"));

pub struct OpenGraphModule;

impl ExtractorModule for OpenGraphModule {
    fn name(&self) -> &'static str {
        "open_graph"
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        let mut tags: Map<String, Value> = Map::new();

        for meta in ctx.raw_document().select(&SELECTOR_PROPERTY_META) {
            let (Some(property), Some(content)) = (meta.value().attr("property"), meta.value().attr("content")) else {
                continue;
            };
            let property = property.trim().to_lowercase();
            let key = if let Some(stripped) = property.strip_prefix("og:") {
                stripped.to_string()
            } else if property.starts_with("product:") {
                property
            } else {
                continue;
            };

            let content = clean_text(content);
            // * The first tag wins; repeated og:image tags list the main image first
            if content.is_empty() || tags.contains_key(&key) {
                continue;
            }
            tags.insert(key, Value::String(content));
        }

        if tags.is_empty() {
            debug!("Open Graph: No tags found");
            return Ok(ExtractionOutcome::not_found());
        }

        // * Availability is stored in schema.org form so its fan-out is comparable
        for key in ["availability", "product:availability"] {
            if let Some(Value::String(raw)) = tags.get(key) {
                let normalized = normalize_availability(
                    raw,
                    &ctx.keywords(AVAILABILITY_IN_STOCK),
                    &ctx.keywords(AVAILABILITY_OUT_OF_STOCK),
                    &ctx.keywords(AVAILABILITY_PREORDER),
                );
                match normalized {
                    Some(state) => {
                        tags.insert(key.to_string(), Value::String(state));
                    }
                    None => {
                        tags.remove(key);
                    }
                }
            }
        }

        let amount = ["price:amount", "product:price:amount"]
            .iter()
            .find_map(|key| tags.get(*key).and_then(Value::as_str).and_then(clean_price_text))
            .and_then(Number::from_f64);
        if let Some(amount) = amount {
            tags.insert("price".to_string(), Value::Number(amount));
        }

        let currency = ["price:currency", "product:price:currency"]
            .iter()
            .find_map(|key| tags.get(*key).and_then(Value::as_str))
            .map(|code| code.trim().to_uppercase())
            .filter(|code| code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()));
        if let Some(currency) = currency {
            tags.insert("currency".to_string(), Value::String(currency));
        }

        // * Image URLs fan out to the image field, so they must be absolute
        for key in ["image", "image:url", "image:secure_url"] {
            if let Some(Value::String(raw)) = tags.get(key) {
                match ctx.resolve_url(raw) {
                    Some(resolved) => {
                        tags.insert(key.to_string(), Value::String(resolved));
                    }
                    None => {
                        tags.remove(key);
                    }
                }
            }
        }

        if tags.is_empty() {
            debug!("Open Graph: No usable tags left");
            return Ok(ExtractionOutcome::not_found());
        }

        info!(tags = tags.len(), "Open Graph: Raw tags found");
        Ok(ExtractionOutcome::found(
            Value::Object(tags),
            "meta[property^='og:']",
            FieldExtractionStatus::OpenGraph,
            200,
        ))
    }
}
