// * DOM tree shaking for the "cleaned" document variant.
// * Removes scripts, styles, comments, configured noise sections, and empty wrappers.
// * The raw document is never touched; modules choose which variant to read.

use ego_tree::NodeId;
use scraper::{Html, Node, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::core::error::ConfigError;

// * Elements that never carry product content
const NOISE_TAGS: [&str; 8] = [
    "script", "style", "noscript", "link", "template", "svg", "iframe", "button",
];

// * Elements that are meaningful without text content
const SELF_CONTAINED_TAGS: [&str; 8] = [
    "img", "br", "hr", "input", "meta", "source", "picture", "video",
];

static SELECTOR_BODY_DESCENDANTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body *").expect("Invalid body selector"));
static SELECTOR_MEDIA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img, picture, video, input, meta").expect("Invalid media selector"));

/// Produces the noise-stripped parse tree used by text-oriented parsers
#[derive(Debug, Clone)]
pub struct HtmlPreprocessor {
    noise_selectors: Vec<Selector>,
}

impl HtmlPreprocessor {
    /// Builds a preprocessor from configured CSS selectors; an invalid selector is a startup error
    pub fn new(selectors: &[String]) -> Result<Self, ConfigError> {
        let noise_selectors = selectors
            .iter()
            .map(|raw| {
                Selector::parse(raw).map_err(|_| ConfigError::InvalidSelector(raw.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { noise_selectors })
    }

    /// Preprocessor that only strips the fixed noise tags and comments
    pub fn tags_only() -> Self {
        Self {
            noise_selectors: Vec::new(),
        }
    }

    pub fn selector_count(&self) -> usize {
        self.noise_selectors.len()
    }

    /// Parses `html` and returns the cleaned document
    pub fn clean(&self, html: &str) -> Html {
        if html.trim().is_empty() {
            warn!("HTML Processor: Received empty HTML content");
        }

        let mut document = Html::parse_document(html);

        // * Step 1: Noise tags and comments
        let mut doomed: Vec<NodeId> = document
            .tree
            .root()
            .descendants()
            .filter(|node| match node.value() {
                Node::Comment(_) => true,
                Node::Element(el) => NOISE_TAGS.contains(&el.name()),
                _ => false,
            })
            .map(|node| node.id())
            .collect();

        // * Step 2: Configured noise sections (header, footer, cookie banners, ...)
        for selector in &self.noise_selectors {
            doomed.extend(document.select(selector).map(|el| el.id()));
        }

        let removed = detach_all(&mut document, &doomed);

        // * Step 3: Wrappers left without text or media
        let empties: Vec<NodeId> = document
            .select(&SELECTOR_BODY_DESCENDANTS)
            .filter(|el| !SELF_CONTAINED_TAGS.contains(&el.value().name()))
            .filter(|el| el.text().all(|t| t.trim().is_empty()))
            .filter(|el| el.select(&SELECTOR_MEDIA).next().is_none())
            .map(|el| el.id())
            .collect();

        let emptied = detach_all(&mut document, &empties);

        debug!(removed, emptied, "HTML Processor: Cleanup complete");
        document
    }
}

impl Default for HtmlPreprocessor {
    fn default() -> Self {
        Self::tags_only()
    }
}

fn detach_all(document: &mut Html, ids: &[NodeId]) -> usize {
    let mut count = 0;
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
            count += 1;
        }
    }
    count
}

/// Whitespace-normalised visible text of the document body (or whole document)
pub fn body_text(document: &Html) -> String {
    static SELECTOR_BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("Invalid body selector"));

    let raw: String = match document.select(&SELECTOR_BODY).next() {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => document.root_element().text().collect::<Vec<_>>().join(" "),
    };
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_html() -> &'static str {
        r#"
        <html lang="nl">
        <head>
            <title>Boormachine</title>
            <script>var tracking = 1;</script>
            <style>.x { color: red; }</style>
        </head>
        <body>
            <header><a href="/">Home</a></header>
            <!-- promo banner -->
            <div class="cookie-banner">Wij gebruiken cookies</div>
            <main>
                <h1>Acme Boormachine 500W</h1>
                <div class="gallery"><img src="/drill.jpg" alt="drill"></div>
                <div class="spacer"><span>   </span></div>
                <p>Krachtige boormachine voor elk klusje.</p>
                <button>In winkelwagen</button>
            </main>
            <footer>Copyright 2024</footer>
        </body>
        </html>
        "#
    }

    #[test]
    fn test_noise_tags_removed() {
        let cleaned = HtmlPreprocessor::tags_only().clean(sample_html());
        let html = cleaned.root_element().html();

        assert!(!html.contains("var tracking"));
        assert!(!html.contains("color: red"));
        assert!(!html.contains("promo banner"));
        assert!(!html.contains("In winkelwagen"));
        assert!(html.contains("Acme Boormachine 500W"));
    }

    #[test]
    fn test_configured_selectors_removed() {
        let preprocessor = HtmlPreprocessor::new(&[
            "header".to_string(),
            "footer".to_string(),
            "[class*='cookie']".to_string(),
        ])
        .unwrap();
        let text = body_text(&preprocessor.clean(sample_html()));

        assert!(!text.contains("Wij gebruiken cookies"));
        assert!(!text.contains("Copyright"));
        assert!(text.contains("Krachtige boormachine"));
    }

    #[test]
    fn test_empty_wrappers_removed_but_images_kept() {
        let cleaned = HtmlPreprocessor::tags_only().clean(sample_html());
        let html = cleaned.root_element().html();

        assert!(!html.contains("spacer"));
        assert!(html.contains("gallery"));
        assert!(html.contains("/drill.jpg"));
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let result = HtmlPreprocessor::new(&["div[".to_string()]);
        assert!(matches!(result, Err(ConfigError::InvalidSelector(_))));
    }

    #[test]
    fn test_empty_input() {
        let cleaned = HtmlPreprocessor::tags_only().clean("");
        assert!(body_text(&cleaned).is_empty());
    }
}
