//! HTML serialization of arena nodes through html5ever's serializer.

use std::collections::VecDeque;
use std::io;

use html5ever::QualName;
use html5ever::serialize::{
    Serialize, SerializeOpts, Serializer, TraversalScope, serialize as html_serialize,
};
use tracing::warn;

use super::arena::{Dom, NodeData, NodeId};

/// A node of the arena as html5ever sees it.
struct SerializableNode<'a> {
    dom: &'a Dom,
    id: NodeId,
}

enum SerializeOp {
    Open(NodeId),
    Close(QualName),
}

impl SerializableNode<'_> {
    fn children(&self, id: NodeId) -> Vec<SerializeOp> {
        self.dom.children(id).map(SerializeOp::Open).collect()
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let mut ops: VecDeque<SerializeOp> = match traversal_scope {
            TraversalScope::IncludeNode => VecDeque::from([SerializeOp::Open(self.id)]),
            TraversalScope::ChildrenOnly(_) => self.children(self.id).into(),
        };

        while let Some(op) = ops.pop_front() {
            let id = match op {
                SerializeOp::Open(id) => id,
                SerializeOp::Close(name) => {
                    serializer.end_elem(name)?;
                    continue;
                }
            };
            let Some(node) = self.dom.get(id) else { continue };

            match &node.data {
                NodeData::Element { name, attrs, .. } => {
                    serializer.start_elem(
                        name.clone(),
                        attrs.iter().map(|attr| (&attr.name, attr.value.as_str())),
                    )?;
                    ops.push_front(SerializeOp::Close(name.clone()));
                    for child in self.children(id).into_iter().rev() {
                        ops.push_front(child);
                    }
                }
                NodeData::Document | NodeData::Fragment => {
                    for child in self.children(id).into_iter().rev() {
                        ops.push_front(child);
                    }
                }
                NodeData::Doctype { name, .. } => serializer.write_doctype(name)?,
                NodeData::Text(text) => serializer.write_text(text)?,
                NodeData::Comment(text) => serializer.write_comment(text)?,
            }
        }
        Ok(())
    }
}

fn write(dom: &Dom, id: NodeId, traversal_scope: TraversalScope) -> String {
    let node = SerializableNode { dom, id };
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };

    let mut bytes = Vec::new();
    if let Err(e) = html_serialize(&mut bytes, &node, opts) {
        warn!(error = %e, "serialization stopped early");
    }
    String::from_utf8(bytes).unwrap_or_default()
}

/// Serialize a whole document, doctype included.
pub fn serialize_document(dom: &Dom) -> String {
    serialize_children(dom, dom.document())
}

/// Serialize a node and its subtree (`outerHTML`).
pub fn serialize(dom: &Dom, id: NodeId) -> String {
    write(dom, id, TraversalScope::IncludeNode)
}

/// Serialize only the children of a node (`innerHTML`). Children of raw text
/// elements such as `<script>` are written unescaped.
pub fn serialize_children(dom: &Dom, id: NodeId) -> String {
    let parent = match dom.get(id).map(|n| &n.data) {
        Some(NodeData::Element { name, .. }) => Some(name.clone()),
        _ => None,
    };
    write(dom, id, TraversalScope::ChildrenOnly(parent))
}

/// Escape text content for HTML.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
