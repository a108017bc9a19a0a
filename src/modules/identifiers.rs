// * Product identifiers. The module has no field of its own: its `{sku, ean}`
// * object is fanned out to the `sku` and `ean` fields by the executor.

use scraper::Selector;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, info};

use super::support::{as_text, content_or_text, product_nodes};
use crate::core::context::{DocumentKind, RequestContext};
use crate::core::error::ModuleError;
use crate::core::module::ExtractorModule;
use crate::core::types::{ExtractionOutcome, FieldExtractionStatus};
use crate::refinery::text::{is_valid_ean_checksum, normalize_ean};

static SELECTOR_ITEMPROP_SKU: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemprop='sku']").expect("Invalid itemprop selector"));
static SELECTOR_ITEMPROP_GTIN: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemprop='gtin13'], [itemprop='gtin'], [itemprop='gtin12'], [itemprop='gtin14'], [itemprop='gtin8']")
        .expect("Invalid itemprop selector")
});

const GTIN_KEYS: [&str; 5] = ["gtin13", "gtin", "gtin12", "gtin14", "gtin8"];
const MAX_SKU_LENGTH: usize = 64;

/// Normalised EAN when the check digit is valid
fn valid_ean(raw: &str) -> Option<String> {
    let ean = normalize_ean(raw);
    is_valid_ean_checksum(&ean).then_some(ean)
}

fn valid_sku(raw: String) -> Option<String> {
    let len = raw.chars().count();
    (len > 0 && len <= MAX_SKU_LENGTH && !raw.contains(char::is_whitespace)).then_some(raw)
}

#[derive(Default)]
struct Identifiers {
    sku: Option<String>,
    ean: Option<String>,
}

impl Identifiers {
    fn is_empty(&self) -> bool {
        self.sku.is_none() && self.ean.is_none()
    }

    fn into_value(self) -> Value {
        let mut map = Map::new();
        if let Some(sku) = self.sku {
            map.insert("sku".to_string(), Value::String(sku));
        }
        if let Some(ean) = self.ean {
            map.insert("ean".to_string(), Value::String(ean));
        }
        Value::Object(map)
    }
}

pub struct IdentifiersModule;

impl IdentifiersModule {
    fn from_json_ld(ctx: &RequestContext) -> Identifiers {
        let nodes = product_nodes(ctx);
        Identifiers {
            sku: nodes
                .iter()
                .find_map(|node| node.get("sku").and_then(as_text))
                .and_then(valid_sku),
            ean: nodes
                .iter()
                .find_map(|node| GTIN_KEYS.iter().find_map(|key| node.get(*key).and_then(as_text)))
                .and_then(|raw| valid_ean(&raw)),
        }
    }

    fn from_itemprop(ctx: &RequestContext) -> Identifiers {
        let document = ctx.raw_document();
        Identifiers {
            sku: document
                .select(&SELECTOR_ITEMPROP_SKU)
                .find_map(|el| {
                    let sku = valid_sku(content_or_text(&el))?;
                    ctx.claim(DocumentKind::Raw, &el);
                    Some(sku)
                }),
            ean: document
                .select(&SELECTOR_ITEMPROP_GTIN)
                .find_map(|el| {
                    let ean = valid_ean(&content_or_text(&el))?;
                    ctx.claim(DocumentKind::Raw, &el);
                    Some(ean)
                }),
        }
    }
}

impl ExtractorModule for IdentifiersModule {
    fn name(&self) -> &'static str {
        "identifiers"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["json_ld"]
    }

    fn declares_field(&self) -> bool {
        false
    }

    fn extract(&self, ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        // * One outcome carries one score, so the two sources are never mixed
        let structured = Self::from_json_ld(ctx);
        if !structured.is_empty() {
            info!(sku = ?structured.sku, ean = ?structured.ean, "Identifiers: Extracted from JSON-LD");
            return Ok(ExtractionOutcome::found(
                structured.into_value(),
                "json_ld",
                FieldExtractionStatus::JsonLd,
                200,
            ));
        }

        let microdata = Self::from_itemprop(ctx);
        if !microdata.is_empty() {
            info!(sku = ?microdata.sku, ean = ?microdata.ean, "Identifiers: Extracted from microdata");
            return Ok(ExtractionOutcome::found(
                microdata.into_value(),
                "itemprop",
                FieldExtractionStatus::ModuleHeuristic,
                120,
            ));
        }

        debug!("Identifiers: None found");
        Ok(ExtractionOutcome::not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::json_ld::JsonLdModule;
    use crate::modules::support::test_support::context_after;
    use serde_json::json;

    fn identifiers_of(html: &str) -> ExtractionOutcome {
        let ctx = context_after(html, &[&JsonLdModule]);
        IdentifiersModule.extract(&ctx).unwrap()
    }

    #[test]
    fn test_json_ld_sku_and_gtin() {
        let outcome = identifiers_of(
            r#"<script type="application/ld+json">{"@type": "Product", "sku": "DR-500", "gtin13": "4006381333931"}</script>"#,
        );
        assert_eq!(outcome.value, json!({"sku": "DR-500", "ean": "4006381333931"}));
        assert_eq!(outcome.score, 200);
        assert!(!IdentifiersModule.declares_field());
    }

    #[test]
    fn test_invalid_checksum_dropped() {
        let outcome = identifiers_of(
            r#"<script type="application/ld+json">{"@type": "Product", "gtin13": "4006381333932"}</script>"#,
        );
        assert!(!outcome.is_found());
    }

    #[test]
    fn test_microdata_fallback() {
        let outcome = identifiers_of(
            r#"<div itemscope><meta itemprop="sku" content="AB123"><span itemprop="gtin13">4006381333931</span></div>"#,
        );
        assert_eq!(outcome.value, json!({"sku": "AB123", "ean": "4006381333931"}));
        assert_eq!(outcome.status, FieldExtractionStatus::ModuleHeuristic);
    }
}
