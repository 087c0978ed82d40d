//! Live ranges over the arena, modelled on the DOM `Range` interface.
//!
//! A [`Range`] is two boundary points. Before its contents can be cloned or
//! deleted the text boundaries are split ([`Range::split`]) so that every
//! boundary falls between nodes; from then on containment is plain
//! document-order arithmetic.

use std::collections::HashMap;

use super::arena::{Dom, NodeId};

/// A boundary point: a character offset inside a text node, or a child index
/// inside any other node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selected span of the document, start before end in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// Range covering the whole text of a single text node.
    pub fn over_text(dom: &Dom, text_node: NodeId) -> Self {
        let len = dom.text(text_node).map_or(0, |t| t.chars().count());
        Self::new(Boundary::new(text_node, 0), Boundary::new(text_node, len))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The selected text, as `Selection.toString()` would report it.
    pub fn text(&self, dom: &Dom) -> String {
        if let Some(text) = dom.text(self.start.node)
            && self.start.node == self.end.node
        {
            return char_slice(text, self.start.offset, self.end.offset).to_string();
        }

        let root = topmost(dom, self.start.node);
        let order = Order::new(dom, root);
        let start_pos = order.boundary(dom, &self.start);
        let end_pos = order.boundary(dom, &self.end);

        let mut out = String::new();
        for id in dom.text_nodes(root) {
            let Some(text) = dom.text(id) else { continue };
            let after_start = id == self.start.node || start_pos <= order.enter(id);
            let before_end = id == self.end.node || order.exit(id) < end_pos;
            if !(after_start && before_end) {
                continue;
            }
            let from = if id == self.start.node { self.start.offset } else { 0 };
            let to = if id == self.end.node { self.end.offset } else { usize::MAX };
            out.push_str(char_slice(text, from, to));
        }
        out
    }

    /// Split the text nodes the boundaries fall inside, returning the
    /// equivalent node-aligned range.
    pub fn split(&self, dom: &mut Dom) -> SplitRange {
        // End first: splitting it never moves a start offset in the same node.
        let end = split_point(dom, self.end);
        let start = split_point(dom, self.start);
        SplitRange { start, end }
    }
}

/// A position between two children of `parent`; `before` is
/// [`NodeId::NONE`] at the end of the child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub parent: NodeId,
    pub before: NodeId,
}

/// Where spliced content goes: right after `after` in `parent`, or at the very
/// beginning when `after` is [`NodeId::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint {
    pub parent: NodeId,
    pub after: NodeId,
}

impl InsertionPoint {
    /// Move every child of `container` to this point, preserving order.
    pub fn splice_children(&self, dom: &mut Dom, container: NodeId) {
        let children: Vec<_> = dom.children(container).collect();
        let mut after = self.after;
        for child in children {
            let before = if after.is_some() {
                dom.get(after).map(|n| n.next_sibling).unwrap_or(NodeId::NONE)
            } else {
                dom.get(self.parent).map(|n| n.first_child).unwrap_or(NodeId::NONE)
            };
            dom.insert_at(self.parent, before, child);
            after = child;
        }
    }
}

/// A range whose boundaries sit between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRange {
    pub start: Point,
    pub end: Point,
}

impl SplitRange {
    /// Deepest node containing both boundaries.
    fn common_ancestor(&self, dom: &Dom) -> NodeId {
        std::iter::once(self.start.parent)
            .chain(dom.ancestors(self.start.parent))
            .find(|&candidate| dom.is_inclusive_ancestor(candidate, self.end.parent))
            .unwrap_or(self.start.parent)
    }

    fn classify(&self, dom: &Dom) -> (NodeId, Order, usize, usize) {
        let common = self.common_ancestor(dom);
        let order = Order::new(dom, common);
        let start = order.point(&self.start);
        let end = order.point(&self.end);
        (common, order, start, end)
    }

    /// Copy the selected content into `container`: fully selected nodes are
    /// deep-cloned, partially selected ones are cloned shallowly and filled
    /// with their selected part.
    pub fn clone_contents_into(&self, dom: &mut Dom, container: NodeId) {
        let (common, order, start, end) = self.classify(dom);
        clone_between(dom, &order, common, container, start, end);
    }

    /// Remove fully selected nodes and return where the range collapsed to.
    pub fn delete_contents(&self, dom: &mut Dom) -> InsertionPoint {
        let (common, order, start, end) = self.classify(dom);

        let at = if dom.is_inclusive_ancestor(self.start.parent, self.end.parent) {
            let after = if self.start.before.is_some() {
                dom.get(self.start.before).map(|n| n.prev_sibling).unwrap_or(NodeId::NONE)
            } else {
                dom.get(self.start.parent).map(|n| n.last_child).unwrap_or(NodeId::NONE)
            };
            InsertionPoint {
                parent: self.start.parent,
                after,
            }
        } else {
            let reference = std::iter::once(self.start.parent)
                .chain(dom.ancestors(self.start.parent))
                .find(|&n| dom.parent(n) == common)
                .unwrap_or(self.start.parent);
            InsertionPoint {
                parent: common,
                after: reference,
            }
        };

        let mut doomed = Vec::new();
        collect_contained(dom, &order, common, start, end, &mut doomed);
        for id in doomed {
            dom.detach(id);
        }
        at
    }
}

fn clone_between(dom: &mut Dom, order: &Order, source: NodeId, dest: NodeId, start: usize, end: usize) {
    let children: Vec<_> = dom.children(source).collect();
    for child in children {
        if order.fully_contained(child, start, end) {
            let copy = dom.deep_clone(child);
            dom.append(dest, copy);
        } else if order.contains(child, start) || order.contains(child, end) {
            let copy = dom.shallow_clone(child);
            dom.append(dest, copy);
            clone_between(dom, order, child, copy, start, end);
        }
    }
}

fn collect_contained(
    dom: &Dom,
    order: &Order,
    parent: NodeId,
    start: usize,
    end: usize,
    out: &mut Vec<NodeId>,
) {
    for child in dom.children(parent) {
        if order.fully_contained(child, start, end) {
            out.push(child);
        } else if order.contains(child, start) || order.contains(child, end) {
            collect_contained(dom, order, child, start, end, out);
        }
    }
}

fn split_point(dom: &mut Dom, boundary: Boundary) -> Point {
    let node = boundary.node;
    if let Some(text) = dom.text(node) {
        let len = text.chars().count();
        let parent = dom.parent(node);
        let next = dom.get(node).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
        return match boundary.offset {
            0 => Point { parent, before: node },
            o if o >= len => Point { parent, before: next },
            o => {
                let tail = dom.split_text(node, o).unwrap_or(next);
                Point { parent, before: tail }
            }
        };
    }

    let before = dom.children(node).nth(boundary.offset).unwrap_or(NodeId::NONE);
    Point { parent: node, before }
}

fn topmost(dom: &Dom, id: NodeId) -> NodeId {
    dom.ancestors(id).last().unwrap_or(id)
}

fn char_slice(text: &str, from: usize, to: usize) -> &str {
    let byte = |chars: usize| text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i);
    let (from, to) = (byte(from), byte(to));
    if from >= to { "" } else { &text[from..to] }
}

/// Entry/exit counters from a pre-order walk. A point before node `n` sits at
/// `enter(n)`; the point after the last child of `p` sits at `exit(p)`.
struct Order {
    marks: HashMap<NodeId, (usize, usize)>,
}

impl Order {
    fn new(dom: &Dom, root: NodeId) -> Self {
        let mut marks = HashMap::new();
        let mut counter = 0;
        Self::visit(dom, root, &mut counter, &mut marks);
        Self { marks }
    }

    fn visit(dom: &Dom, id: NodeId, counter: &mut usize, marks: &mut HashMap<NodeId, (usize, usize)>) {
        let enter = *counter;
        *counter += 1;
        for child in dom.children(id) {
            Self::visit(dom, child, counter, marks);
        }
        marks.insert(id, (enter, *counter));
        *counter += 1;
    }

    fn enter(&self, id: NodeId) -> usize {
        self.marks.get(&id).map_or(usize::MAX, |m| m.0)
    }

    fn exit(&self, id: NodeId) -> usize {
        self.marks.get(&id).map_or(usize::MAX, |m| m.1)
    }

    fn point(&self, point: &Point) -> usize {
        if point.before.is_some() {
            self.enter(point.before)
        } else {
            self.exit(point.parent)
        }
    }

    /// Text boundaries count as the point just before their text node.
    fn boundary(&self, dom: &Dom, boundary: &Boundary) -> usize {
        if dom.is_text(boundary.node) {
            return self.enter(boundary.node);
        }
        match dom.children(boundary.node).nth(boundary.offset) {
            Some(child) => self.enter(child),
            None => self.exit(boundary.node),
        }
    }

    fn contains(&self, id: NodeId, pos: usize) -> bool {
        self.enter(id) < pos && pos <= self.exit(id)
    }

    fn fully_contained(&self, id: NodeId, start: usize, end: usize) -> bool {
        start <= self.enter(id) && self.exit(id) < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, serialize_children};

    #[test]
    fn test_text_within_one_node() {
        let dom = parse_html("<p>reading fast</p>");
        let text = dom.text_nodes(dom.body())[0];
        let range = Range::new(Boundary::new(text, 3), Boundary::new(text, 9));

        assert_eq!(range.text(&dom), "ding f");
    }

    #[test]
    fn test_text_across_elements() {
        let dom = parse_html("<p>one <b>two</b> three</p>");
        let texts = dom.text_nodes(dom.body());
        let range = Range::new(Boundary::new(texts[0], 2), Boundary::new(texts[2], 3));

        assert_eq!(range.text(&dom), "e two th");
    }

    #[test]
    fn test_split_inside_one_text_node() {
        let mut dom = parse_html("<p>abcdef</p>");
        let p = dom.find_by_tag("p").unwrap();
        let text = dom.text_nodes(p)[0];

        let split = Range::new(Boundary::new(text, 2), Boundary::new(text, 4)).split(&mut dom);

        let parts: Vec<_> = dom
            .children(p)
            .map(|c| dom.text(c).unwrap().to_string())
            .collect();
        assert_eq!(parts, ["ab", "cd", "ef"]);
        assert_eq!(dom.text(split.start.before), Some("cd"));
        assert_eq!(dom.text(split.end.before), Some("ef"));
    }

    #[test]
    fn test_clone_and_delete_in_one_text_node() {
        let mut dom = parse_html("<p>abcdef</p>");
        let p = dom.find_by_tag("p").unwrap();
        let text = dom.text_nodes(p)[0];
        let split = Range::new(Boundary::new(text, 2), Boundary::new(text, 4)).split(&mut dom);

        let holder = dom.create_html_element("div", &[]);
        split.clone_contents_into(&mut dom, holder);
        assert_eq!(dom.text_content(holder), "cd");

        let at = split.delete_contents(&mut dom);
        assert_eq!(dom.text_content(p), "abef");

        let marker = dom.create_html_element("i", &[]);
        dom.append_text(marker, "CD");
        dom.append(holder, marker);
        let holder_text = dom.children(holder).next().unwrap();
        dom.detach(holder_text);
        at.splice_children(&mut dom, holder);
        assert_eq!(serialize_children(&dom, p), "ab<i>CD</i>ef");
    }

    #[test]
    fn test_clone_across_paragraphs_clones_partial_parents() {
        let mut dom = parse_html("<div><p>first para</p><p>second para</p></div>");
        let div = dom.find_by_tag("div").unwrap();
        let texts = dom.text_nodes(div);
        let split = Range::new(Boundary::new(texts[0], 6), Boundary::new(texts[1], 6)).split(&mut dom);

        let holder = dom.create_html_element("div", &[]);
        split.clone_contents_into(&mut dom, holder);
        assert_eq!(serialize_children(&dom, holder), "<p>para</p><p>second</p>");

        let at = split.delete_contents(&mut dom);
        assert_eq!(serialize_children(&dom, div), "<p>first </p><p> para</p>");
        assert_eq!(at.parent, div);
    }

    #[test]
    fn test_element_boundaries_select_whole_children() {
        let mut dom = parse_html("<p><b>one</b><i>two</i><u>three</u></p>");
        let p = dom.find_by_tag("p").unwrap();
        let split = Range::new(Boundary::new(p, 1), Boundary::new(p, 3)).split(&mut dom);

        let holder = dom.create_html_element("div", &[]);
        split.clone_contents_into(&mut dom, holder);
        assert_eq!(serialize_children(&dom, holder), "<i>two</i><u>three</u>");

        split.delete_contents(&mut dom);
        assert_eq!(serialize_children(&dom, p), "<b>one</b>");
    }
}
