//! Tree traversal: wrap eligible text nodes, and undo it.

use tracing::debug;

use crate::classify::{Classifier, MARKER_CLASS, PageContext};
use crate::dom::{Dom, NodeData, NodeId};
use crate::intensity::IntensityLevel;
use crate::transform::{BOLD_CLASS, BOLD_STYLE, Fragment, SPACE_STYLE, Transformer};

/// Inline style of a wrapper: generates no box and inherits every text property.
pub const WRAPPER_STYLE: &str = "display: contents !important; \
    font-family: inherit !important; font-size: inherit !important; \
    font-style: inherit !important; color: inherit !important; \
    background: inherit !important; text-align: inherit !important; \
    line-height: inherit !important; letter-spacing: inherit !important; \
    word-spacing: inherit !important; text-decoration: inherit !important; \
    white-space: pre-wrap !important; margin: 0 !important; padding: 0 !important;";

#[derive(Debug, Clone)]
pub struct Walker {
    classifier: Classifier,
    transformer: Transformer,
}

impl Walker {
    pub fn new(classifier: Classifier, level: IntensityLevel) -> Self {
        Self {
            classifier,
            transformer: Transformer::new(level),
        }
    }

    pub fn level(&self) -> IntensityLevel {
        self.transformer.level
    }

    pub fn set_level(&mut self, level: IntensityLevel) {
        self.transformer.level = level;
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn set_context(&mut self, context: PageContext) {
        self.classifier.set_context(context);
    }

    /// Transform every eligible text node at or below `root`. Returns the
    /// number of wrappers created.
    ///
    /// An ineligible element root is skipped whole. A document root stands
    /// for its `<body>`; a fragment root visits each of its children.
    pub fn apply(&self, dom: &mut Dom, root: NodeId) -> usize {
        let wrapped = match dom.get(root).map(|n| &n.data) {
            Some(NodeData::Text(_)) => usize::from(self.wrap(dom, root).is_some()),
            Some(NodeData::Element { .. }) => {
                if !self.classifier.eligible(dom, root) {
                    return 0;
                }
                dom.text_nodes(root)
                    .into_iter()
                    .filter(|&text| self.wrap(dom, text).is_some())
                    .count()
            }
            Some(NodeData::Document) => {
                let body = dom.body();
                return if body == root { 0 } else { self.apply(dom, body) };
            }
            Some(NodeData::Fragment) => {
                let children: Vec<_> = dom.children(root).collect();
                return children.into_iter().map(|c| self.apply(dom, c)).sum();
            }
            Some(NodeData::Comment(_) | NodeData::Doctype { .. }) | None => 0,
        };

        if wrapped > 0 {
            debug!(wrapped, level = %self.transformer.level, "applied emphasis");
        }
        wrapped
    }

    /// Replace one text node by a wrapper. `None` when the node is left alone:
    /// no ASCII letter, no parent, or an ineligible parent.
    fn wrap(&self, dom: &mut Dom, text_id: NodeId) -> Option<NodeId> {
        let text = dom.text(text_id)?;
        if !text.bytes().any(|b| b.is_ascii_alphabetic())
            || !self.classifier.eligible_text(dom, text_id)
        {
            return None;
        }

        let text = text.to_string();
        let wrapper = dom.create_html_element(
            "span",
            &[("class", MARKER_CLASS), ("style", WRAPPER_STYLE)],
        );
        for fragment in self.transformer.render(&text) {
            match fragment {
                Fragment::Space(ws) => {
                    let span = dom.create_html_element("span", &[("style", SPACE_STYLE)]);
                    let inner = dom.create_text(ws);
                    dom.append(span, inner);
                    dom.append(wrapper, span);
                }
                Fragment::Verbatim(s) => dom.append_text(wrapper, s),
                Fragment::Emphasis { bold, rest } => {
                    let span = dom.create_html_element(
                        "span",
                        &[("class", BOLD_CLASS), ("style", BOLD_STYLE)],
                    );
                    let inner = dom.create_text(bold);
                    dom.append(span, inner);
                    dom.append(wrapper, span);
                    if !rest.is_empty() {
                        dom.append_text(wrapper, rest);
                    }
                }
            }
        }

        dom.replace(text_id, wrapper);
        Some(wrapper)
    }

    /// Replace every wrapper at or below `root` by a text node holding its
    /// current text. Returns the number of wrappers removed.
    pub fn remove_effects(dom: &mut Dom, root: NodeId) -> usize {
        let markers = outermost_markers(dom, root);
        for &marker in &markers {
            let text = dom.text_content(marker);
            let replacement = dom.create_text(text);
            dom.replace(marker, replacement);
        }
        if !markers.is_empty() {
            debug!(removed = markers.len(), "removed emphasis");
        }
        markers.len()
    }
}

fn is_marker(dom: &Dom, id: NodeId) -> bool {
    dom.is_element(id) && dom.has_class(id, MARKER_CLASS)
}

/// Outermost wrapper that is or contains `id`.
pub(crate) fn enclosing_marker(dom: &Dom, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(dom.ancestors(id))
        .filter(|&a| is_marker(dom, a))
        .last()
}

fn outermost_markers(dom: &Dom, root: NodeId) -> Vec<NodeId> {
    dom.descendants(root)
        .into_iter()
        .filter(|&id| is_marker(dom, id))
        .filter(|&id| !dom.ancestors(id).any(|a| is_marker(dom, a)))
        .collect()
}

/// Number of wrappers at or below `root`.
pub fn count_markers(dom: &Dom, root: NodeId) -> usize {
    dom.descendants(root)
        .into_iter()
        .filter(|&id| is_marker(dom, id))
        .count()
}
