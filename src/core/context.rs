// * Per-request analysis workspace.
// * Owns both parse trees, so it is neither Send nor Sync: a context can only
// * ever be reached from the single run that created it.

use ego_tree::NodeId;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::refinery::language::detect_language;
use crate::refinery::patterns::PatternProvider;
use crate::refinery::resources::SharedResources;

/// Which parse tree an element belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Raw,
    Cleaned,
}

pub struct RequestContext {
    url: String,
    base_url: Option<Url>,
    lang_code: String,
    use_llm: bool,
    resources: Arc<SharedResources>,
    raw: Html,
    cleaned: Html,
    claimed: RefCell<HashSet<(DocumentKind, NodeId)>>,
    outputs: HashMap<String, Value>,
}

impl RequestContext {
    /// Parses the page, builds the cleaned variant, and detects the language
    pub fn new(html: &str, url: &str, use_llm: bool, resources: Arc<SharedResources>) -> Self {
        let raw = Html::parse_document(html);
        let cleaned = resources.preprocessor.clean(html);
        let lang_code = detect_language(&raw, &cleaned, &resources.patterns);
        let base_url = Url::parse(url).ok();

        debug!(url = %url, lang = %lang_code, use_llm, "Request context created");

        Self {
            url: url.to_string(),
            base_url,
            lang_code,
            use_llm,
            resources,
            raw,
            cleaned,
            claimed: RefCell::new(HashSet::new()),
            outputs: HashMap::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn lang_code(&self) -> &str {
        &self.lang_code
    }

    /// Whether optional LLM-backed sub-parsers may run
    pub fn use_llm(&self) -> bool {
        self.use_llm
    }

    pub fn raw_document(&self) -> &Html {
        &self.raw
    }

    pub fn cleaned_document(&self) -> &Html {
        &self.cleaned
    }

    pub fn patterns(&self) -> &PatternProvider {
        &self.resources.patterns
    }

    /// Keyword list for the page language followed by the default language
    pub fn keywords(&self, name: &str) -> Vec<String> {
        self.resources.patterns.keywords(&self.lang_code, name)
    }

    pub fn regex(&self, name: &str) -> Option<&Regex> {
        self.resources.patterns.regex(&self.lang_code, name)
    }

    /// Raw output of a module that already ran
    pub fn output(&self, module: &str) -> Option<&Value> {
        self.outputs.get(module)
    }

    pub fn outputs(&self) -> &HashMap<String, Value> {
        &self.outputs
    }

    /// Records a module's raw output; a later write under the same name replaces it
    pub fn insert_output(&mut self, module: &str, value: Value) {
        self.outputs.insert(module.to_string(), value);
    }

    /// Marks an element as used by a field. Returns false if it was already claimed.
    pub fn claim(&self, kind: DocumentKind, element: &ElementRef) -> bool {
        self.claimed.borrow_mut().insert((kind, element.id()))
    }

    pub fn is_claimed(&self, kind: DocumentKind, element: &ElementRef) -> bool {
        self.claimed.borrow().contains(&(kind, element.id()))
    }

    /// Resolves a possibly relative link against the page URL
    pub fn resolve_url(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with("data:") {
            return None;
        }
        match &self.base_url {
            Some(base) => base.join(href).ok().map(|u| u.to_string()),
            None => Url::parse(href).ok().map(|u| u.to_string()),
        }
    }
}
