use argus_extractor::core::{
    AnalyzerError, ExtractionOutcome, ExtractorModule, FieldExtractionStatus, ModuleError, ModuleRegistry,
    RequestContext,
};
use argus_extractor::modules::{JsonLdModule, PriceModule, TitleModule};
use argus_extractor::refinery::SharedResources;
use argus_extractor::{AnalysisRequest, ProductPageAnalyzer, Settings, Tier};
use serde_json::json;
use std::sync::Arc;

// * Test Suite for the full analysis pipeline

const PRODUCT_PAGE: &str = r#"
<html lang="nl">
<head>
    <title>Accuboormachine Acme 500W | Bouwmarkt</title>
    <meta property="og:title" content="Acme Accuboormachine 500W">
    <meta property="og:image" content="/media/drill.jpg">
    <meta property="product:price:amount" content="89,95">
    <script type="application/ld+json">
    {
        "@context": "https://schema.org",
        "@type": "Product",
        "name": "Acme Accuboormachine 500W",
        "brand": {"@type": "Brand", "name": "Acme"},
        "sku": "AC-500",
        "gtin13": "4006381333931",
        "offers": {
            "@type": "Offer",
            "price": "89.95",
            "priceCurrency": "EUR",
            "availability": "https://schema.org/InStock"
        }
    }
    </script>
    <script type="application/ld+json">
    {"@type": "BreadcrumbList", "itemListElement": [
        {"position": 1, "name": "Home"},
        {"position": 2, "name": "Gereedschap"},
        {"position": 3, "name": "Boormachines"}
    ]}
    </script>
</head>
<body>
    <h1>Acme Accuboormachine 500W</h1>
    <p>Deze krachtige accuboormachine van Acme wordt geleverd met twee accu's en een stevige koffer.</p>
</body>
</html>
"#;

const SPEC_TABLE_PAGE: &str = r#"
<html><head><title>Cordless drill | Shop</title></head>
<body>
    <h1>Cordless drill 18V</h1>
    <table>
        <tr><th>Merk</th><td>Acme</td></tr>
        <tr><th>Gewicht</th><td>1.2 kg</td></tr>
    </table>
</body></html>
"#;

fn analyzer() -> ProductPageAnalyzer {
    ProductPageAnalyzer::new(&Settings::default()).unwrap()
}

fn page_with_title(title: &str) -> String {
    format!(
        r#"<html><head><script type="application/ld+json">{{"@type": "Product", "name": "{title}", "offers": {{"price": "10.00"}}}}</script></head><body></body></html>"#
    )
}

#[test]
fn test_full_product_page() {
    let report = analyzer()
        .analyze(&AnalysisRequest::new(PRODUCT_PAGE, "https://shop.example/p/ac-500"))
        .unwrap();
    let data = &report.data;

    assert_eq!(data["title"], json!("Acme Accuboormachine 500W"));
    assert_eq!(data["price"], json!(89.95));
    assert_eq!(data["currency"], json!("EUR"));
    assert_eq!(data["brand"], json!("Acme"));
    assert_eq!(data["availability"], json!("InStock"));
    assert_eq!(data["sku"], json!("AC-500"));
    assert_eq!(data["ean"], json!("4006381333931"));
    assert_eq!(data["breadcrumbs"], json!(["Gereedschap", "Boormachines"]));
    assert_eq!(data["image"], json!("https://shop.example/media/drill.jpg"));
    assert!(data["description"].as_str().unwrap().starts_with("Deze krachtige"));

    assert_eq!(report.field_status["title"], FieldExtractionStatus::JsonLd);
    assert_eq!(report.selectors_used["sku"], "identifiers (json_ld)");
    // * open_graph runs first, so its price fan-out wins the 200 tie with JSON-LD offers
    assert_eq!(report.selectors_used["price"], "open_graph (meta[property^='og:'])");
    assert_eq!(report.field_status["price"], FieldExtractionStatus::OpenGraph);
}

#[test]
fn test_open_graph_price_seeds_price_field() {
    let html = r#"
        <html><head>
            <meta property="og:title" content="Acme Accuboormachine 500W">
            <meta property="product:price:amount" content="1.299,00">
            <meta property="product:price:currency" content="EUR">
        </head><body></body></html>
    "#;
    let report = analyzer()
        .analyze(&AnalysisRequest::new(html, "https://shop.example/p/og"))
        .unwrap();

    assert_eq!(report.data["price"], json!(1299.0));
    assert_eq!(report.data["currency"], json!("EUR"));
    assert_eq!(report.field_status["price"], FieldExtractionStatus::OpenGraph);
    assert!(report.selectors_used["price"].starts_with("open_graph"));
}

#[test]
fn test_custom_registry_without_open_graph() {
    let modules: Vec<Arc<dyn ExtractorModule>> = vec![Arc::new(JsonLdModule), Arc::new(PriceModule), Arc::new(TitleModule)];
    let registry = ModuleRegistry::from_modules(modules).unwrap();
    let analyzer = ProductPageAnalyzer::with_parts(
        Arc::new(registry),
        SharedResources::global(),
        Settings::default().alias_map(),
    );

    let html = r#"<script type="application/ld+json">{"@type": "Product", "name": "Acme Drill 500W", "offers": {"price": "19,99"}}</script>"#;
    let report = analyzer.analyze(&AnalysisRequest::new(html, "https://shop.example/p/1")).unwrap();

    assert_eq!(report.data["price"], json!(19.99));
    assert!(report.selectors_used["price"].contains("json_ld"));
    assert_eq!(report.data["title"], json!("Acme Drill 500W"));
    assert!(report.data["brand"].is_null());
    assert!(report.data["open_graph"].is_null());
}

#[test]
fn test_pro_tier_adds_specifications_and_enrichment() {
    let analyzer = analyzer();
    let request = AnalysisRequest::new(SPEC_TABLE_PAGE, "https://shop.example/p/2").with_tier(Tier::Pro);
    let report = analyzer.analyze(&request).unwrap();

    assert_eq!(report.data["specifications"][0]["details"]["Merk"], json!("Acme"));
    assert_eq!(report.data["brand"], json!("Acme"));
    assert_eq!(report.field_status["brand"], FieldExtractionStatus::FoundInSpecs);
    assert_eq!(report.selectors_used["brand"], "specifications (key: Merk)");
}

#[test]
fn test_free_tier_has_no_specifications() {
    let report = analyzer()
        .analyze(&AnalysisRequest::new(SPEC_TABLE_PAGE, "https://shop.example/p/2"))
        .unwrap();

    assert!(report.data["specifications"].is_null());
    assert!(report.data["brand"].is_null());
}

#[test]
fn test_pro_request_degrades_when_pro_disabled() {
    let settings = Settings {
        pro_enabled: false,
        ..Settings::default()
    };
    let analyzer = ProductPageAnalyzer::new(&settings).unwrap();
    let request = AnalysisRequest::new(SPEC_TABLE_PAGE, "https://shop.example/p/2").with_tier(Tier::Pro);
    let report = analyzer.analyze(&request).unwrap();

    assert!(report.data["specifications"].is_null());
    assert_eq!(report.data["title"], json!("Cordless drill 18V"));
}

struct Cyclic(&'static str, &'static [&'static str]);

impl ExtractorModule for Cyclic {
    fn name(&self) -> &'static str {
        self.0
    }
    fn dependencies(&self) -> &[&'static str] {
        self.1
    }
    fn extract(&self, _ctx: &RequestContext) -> Result<ExtractionOutcome, ModuleError> {
        Ok(ExtractionOutcome::not_found())
    }
}

#[test]
fn test_cycle_fails_the_run() {
    let modules: Vec<Arc<dyn ExtractorModule>> = vec![
        Arc::new(Cyclic("title", &["price"])),
        Arc::new(Cyclic("price", &["title"])),
        Arc::new(Cyclic("brand", &[])),
    ];
    let analyzer = ProductPageAnalyzer::with_parts(
        Arc::new(ModuleRegistry::from_modules(modules).unwrap()),
        SharedResources::global(),
        Default::default(),
    );

    let result = analyzer.analyze(&AnalysisRequest::new("<p>x</p>", "https://shop.example/p/3"));
    match result {
        Err(AnalyzerError::Dependency(err)) => assert_eq!(err.modules, vec!["price", "title"]),
        other => panic!("expected a dependency error, got {:?}", other.map(|r| r.data)),
    }
    assert_eq!(analyzer.stats().runs_failed, 1);
}

#[test]
fn test_concurrent_runs_are_isolated_across_threads() {
    let analyzer = analyzer();
    let titles: Vec<String> = (0..8).map(|i| format!("Product number {}", i)).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = titles
            .iter()
            .map(|title| {
                let analyzer = &analyzer;
                scope.spawn(move || {
                    let html = page_with_title(title);
                    analyzer.analyze(&AnalysisRequest::new(html, "https://shop.example/p")).unwrap()
                })
            })
            .collect();

        for (handle, title) in handles.into_iter().zip(&titles) {
            let report = handle.join().unwrap();
            assert_eq!(report.data["title"], json!(title));
            assert_eq!(report.data["price"], json!(10.0));
        }
    });

    assert_eq!(analyzer.stats().runs_completed, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_on_blocking_pool() {
    let analyzer = Arc::new(analyzer());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let analyzer = Arc::clone(&analyzer);
            tokio::task::spawn_blocking(move || {
                let title = format!("Async product {}", i);
                let report = analyzer
                    .analyze(&AnalysisRequest::new(page_with_title(&title), "https://shop.example/p"))
                    .unwrap();
                (title, report)
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        let (title, report) = task.unwrap();
        assert_eq!(report.data["title"], json!(title));
    }
}
