//! Built-in extractor modules.
//!
//! `json_ld` and `open_graph` are raw providers: the other modules read their
//! output from the request context. `identifiers` only fans out to `sku`/`ean`.

pub mod availability;
pub mod brand;
pub mod breadcrumbs;
pub mod currency;
pub mod description;
pub mod identifiers;
pub mod image;
pub mod json_ld;
pub mod open_graph;
pub mod price;
pub mod specifications;
pub mod title;

pub(crate) mod support;

use std::sync::Arc;

use crate::core::module::ExtractorModule;
use crate::core::registry::Tier;

pub use availability::AvailabilityModule;
pub use brand::BrandModule;
pub use breadcrumbs::BreadcrumbsModule;
pub use currency::CurrencyModule;
pub use description::DescriptionModule;
pub use identifiers::IdentifiersModule;
pub use image::ImageModule;
pub use json_ld::JsonLdModule;
pub use open_graph::OpenGraphModule;
pub use price::PriceModule;
pub use specifications::SpecificationsModule;
pub use title::TitleModule;

/// Every built-in module with its tier, in registration order
pub fn builtin_modules() -> Vec<(Tier, Arc<dyn ExtractorModule>)> {
    let modules: [(Tier, Arc<dyn ExtractorModule>); 12] = [
        (Tier::Free, Arc::new(JsonLdModule)),
        (Tier::Free, Arc::new(OpenGraphModule)),
        (Tier::Free, Arc::new(TitleModule)),
        (Tier::Free, Arc::new(PriceModule)),
        (Tier::Free, Arc::new(CurrencyModule)),
        (Tier::Free, Arc::new(BrandModule)),
        (Tier::Free, Arc::new(AvailabilityModule)),
        (Tier::Free, Arc::new(ImageModule)),
        (Tier::Free, Arc::new(DescriptionModule)),
        (Tier::Free, Arc::new(BreadcrumbsModule)),
        (Tier::Free, Arc::new(IdentifiersModule)),
        (Tier::Pro, Arc::new(SpecificationsModule)),
    ];
    Vec::from(modules)
}
