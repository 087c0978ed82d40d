//! # bionic
//!
//! Bionic reading for HTML: the leading part of every word is emphasized so
//! the eye can glide over the rest.
//!
//! ## Features
//!
//! - Three intensity levels with per-length emphasis ratios
//! - Exclusion of code, controls, navigation chrome and search results
//! - Incremental re-application on inserted content and in-page navigation
//! - On-demand emphasis of a user selection
//! - Full reversal back to the original text
//!
//! ## Quick Start
//!
//! ```
//! use bionic::{IntensityLevel, bionic_html, strip_html};
//!
//! let html = "<p>Reading faster</p>";
//! let emphasized = bionic_html(html, IntensityLevel::Focus, None).unwrap();
//! assert!(emphasized.contains("bionic-bold"));
//! assert!(!strip_html(&emphasized).contains("bionic-"));
//! ```
//!
//! ## Driving a live page
//!
//! [`Page`] hosts a document the way a content script would: it is seeded
//! from a [`SettingsStore`], receives [`Command`]s, and is told about
//! insertions and navigation through [`DocumentObserver`].
//!
//! ```
//! use bionic::{Command, Page};
//! use bionic::dom::parse_html;
//! use bionic::store::MemoryStore;
//!
//! let dom = parse_html("<p>Hello there</p>");
//! let mut page = Page::new(dom, "https://example.com/", MemoryStore::default()).unwrap();
//! page.load().unwrap();
//! page.handle(&Command::toggle(true)).unwrap();
//! ```

pub mod classify;
pub mod command;
pub mod dom;
pub mod effect;
pub mod error;
pub mod intensity;
pub mod page;
pub mod popup;
pub mod selection;
pub mod store;
pub mod timer;
pub mod transform;
pub(crate) mod util;
pub mod walker;
pub mod watch;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use classify::{Classifier, MARKER_CLASS, PageContext};
pub use command::{Command, Courier, Recipient, TabWatcher};
pub use effect::{EffectController, EffectState, ForcedList, ProcessingMode};
pub use error::{Error, Result};
pub use intensity::{IntensityLevel, bold_length};
pub use page::Page;
pub use store::{DomainProfile, JsonFileStore, MemoryStore, Settings, SettingsStore};
pub use transform::{Fragment, Transformer, tokenize};
pub use walker::Walker;
pub use watch::DocumentObserver;

/// Emphasize a whole HTML document at `level`. `url`, when given, is the
/// document's address and enables the site-specific exclusions.
pub fn bionic_html(html: &str, level: IntensityLevel, url: Option<&str>) -> Result<String> {
    let mut dom = dom::parse_html(html);
    let context = match url {
        Some(url) => PageContext::from_url(url)?,
        None => PageContext::default(),
    };
    let walker = Walker::new(Classifier::new(context)?, level);
    let root = dom.document();
    walker.apply(&mut dom, root);
    Ok(dom::serialize_document(&dom))
}

/// Undo [`bionic_html`]: every wrapper becomes plain text again.
pub fn strip_html(html: &str) -> String {
    let mut dom = dom::parse_html(html);
    let root = dom.document();
    Walker::remove_effects(&mut dom, root);
    dom::serialize_document(&dom)
}
