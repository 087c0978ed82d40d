//! The live document: an arena tree parsed by html5ever.
//!
//! # Example
//!
//! ```
//! use bionic::dom::{parse_html, serialize_children};
//!
//! let dom = parse_html("<p>Hello <b>there</b></p>");
//! let p = dom.find_by_tag("p").unwrap();
//! assert_eq!(dom.text_content(p), "Hello there");
//! assert_eq!(serialize_children(&dom, p), "Hello <b>there</b>");
//! ```

mod arena;
mod element_ref;
mod range;
mod serialize;
mod tree_sink;

pub use arena::{Ancestors, Attribute, ChildrenIter, Dom, Node, NodeData, NodeId};
pub use element_ref::{DomSelectors, ElementRef, SelectorGroup};
pub use range::{Boundary, InsertionPoint, Point, Range, SplitRange};
pub use serialize::{escape_text, serialize, serialize_children, serialize_document};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::DomSink;

/// Parse an HTML document into a [`Dom`]. Never fails: malformed input is
/// recovered the way a browser would.
pub fn parse_html(html: &str) -> Dom {
    parse_document(DomSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Parse HTML bytes, detecting the encoding first.
pub fn parse_html_bytes(html: &[u8]) -> Dom {
    let text = crate::util::decode_text(html, crate::util::extract_meta_charset(html));
    parse_html(&text)
}
