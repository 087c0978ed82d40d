//! Which parts of a page may be transformed.
//!
//! Eligibility is a pure read of the tree: an element's own tag and
//! attributes plus its ancestor chain. Interactive controls, code, embedded
//! content, navigation chrome and already-processed wrappers are refused, and
//! on a recognized search results page so is the results region.

use url::Url;

use crate::dom::{Dom, NodeId, SelectorGroup};
use crate::error::Result;

/// Class carried by every generated wrapper.
pub const MARKER_CLASS: &str = "bionic-processed";

/// Refused when the element or any ancestor matches.
const EXCLUDED_REGIONS: &str = r#"
    script, style, noscript, iframe, input, textarea,
    button, select, option, code, pre,
    [contenteditable="true"],
    svg, img, .bionic-processed,
    a[role="button"], [class*="button"], [class*="btn"],
    [role="button"], [role="tab"], [role="link"],
    .button, .btn,
    [class*="upload"], [class*="download"],
    [class*="nav"], [class*="menu"],
    [class*="icon"], [class*="logo"]
"#;

/// Refused only when the element itself matches.
const EXCLUDED_ELEMENTS: &str = r#"
    script, style, svg, img, video, audio, canvas, button, a,
    [aria-hidden="true"], [contenteditable="true"],
    [role="button"], [role="link"]
"#;

/// Result titles, snippets and their containers on a search results page.
const SEARCH_RESULTS: &str = r#"
    #search, .g, .MjjYud, .VwiC3b, .LC20lb, .yuRUbf, .IsZvec,
    .r8s4j, .DKV0Md, [data-content-feature="1"], div[data-hveid]
"#;

/// Where the document lives; feeds the context-dependent rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub host: String,
    pub path: String,
}

impl PageContext {
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)?;
        Ok(Self {
            host: parsed.host_str().unwrap_or_default().to_string(),
            path: parsed.path().to_string(),
        })
    }

    fn is_search_host(&self) -> bool {
        self.host.contains("google.")
    }

    /// A Google results page: protected so snippets and titles stay intact.
    /// The `#search` region is looked up in `dom` as it is now.
    pub fn is_search_results_page(&self, dom: &Dom) -> bool {
        self.is_search_host() && (self.path.contains("/search") || dom.get_by_id("search").is_some())
    }
}

/// Eligibility predicate for one page.
#[derive(Debug, Clone)]
pub struct Classifier {
    regions: SelectorGroup,
    elements: SelectorGroup,
    search_results: SelectorGroup,
    context: PageContext,
}

impl Classifier {
    pub fn new(context: PageContext) -> Result<Self> {
        Ok(Self {
            regions: SelectorGroup::parse(EXCLUDED_REGIONS)?,
            elements: SelectorGroup::parse(EXCLUDED_ELEMENTS)?,
            search_results: SelectorGroup::parse(SEARCH_RESULTS)?,
            context,
        })
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    /// The document moved to another URL.
    pub fn set_context(&mut self, context: PageContext) {
        self.context = context;
    }

    /// Classifier for a page without any context-dependent rules.
    pub fn standard() -> Result<Self> {
        Self::new(PageContext::default())
    }

    /// Whether the text directly inside `element` may be transformed.
    /// Non-elements are never eligible.
    pub fn eligible(&self, dom: &Dom, element: NodeId) -> bool {
        if !dom.is_element(element) {
            return false;
        }
        if self.context.is_search_host()
            && self.search_results.closest(dom, element).is_some()
            && self.context.is_search_results_page(dom)
        {
            return false;
        }
        if self.regions.closest(dom, element).is_some() {
            return false;
        }
        !dom.has_class(element, MARKER_CLASS) && !self.elements.matches(dom, element)
    }

    /// A text node inherits its parent element's eligibility.
    pub fn eligible_text(&self, dom: &Dom, text: NodeId) -> bool {
        dom.parent_element(text)
            .is_some_and(|parent| self.eligible(dom, parent))
    }
}
