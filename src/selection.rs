//! On-demand emphasis of a user selection, and the floating toolbar offering it.

use tracing::debug;

use crate::dom::{Boundary, Dom, NodeId, Range};
use crate::effect::{EffectController, EffectState};
use crate::walker::{Walker, enclosing_marker};

/// Delay between the last selection change and the toolbar update.
pub const SELECTION_DEBOUNCE_MS: u64 = 200;

/// Gap between the selection and the toolbar, in CSS pixels.
const TOOLBAR_GAP: f64 = 10.0;

/// Viewport-relative bounding box of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Document scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_top: f64,
    pub scroll_left: f64,
}

/// Absolute toolbar position. The toolbar is centered on `left` by a -50%
/// horizontal translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolbarPlacement {
    pub top: f64,
    pub left: f64,
}

impl ToolbarPlacement {
    /// Inline style positioning the toolbar.
    pub fn style(&self) -> String {
        format!(
            "top: {}px; left: {}px; transform: translateX(-50%); display: block;",
            self.top, self.left
        )
    }
}

/// Above the selection, or below it when there is no room above the fold.
pub fn place_toolbar(rect: Rect, viewport: Viewport, toolbar_height: f64) -> ToolbarPlacement {
    let mut top = rect.top + viewport.scroll_top - toolbar_height - TOOLBAR_GAP;
    if top < viewport.scroll_top {
        top = rect.bottom() + viewport.scroll_top + TOOLBAR_GAP;
    }
    ToolbarPlacement {
        top,
        left: rect.left + viewport.scroll_left + rect.width / 2.0,
    }
}

/// The user's current selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub range: Range,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    selection: Option<Selection>,
    toolbar: Option<ToolbarPlacement>,
    toolbar_height: f64,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(40.0)
    }
}

impl SelectionController {
    pub fn new(toolbar_height: f64) -> Self {
        Self {
            selection: None,
            toolbar: None,
            toolbar_height,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Record a new selection; `None` when it was cleared.
    pub fn select(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Where the toolbar is shown, if visible.
    pub fn toolbar(&self) -> Option<ToolbarPlacement> {
        self.toolbar
    }

    pub fn hide(&mut self) {
        self.toolbar = None;
    }

    fn has_text(&self, dom: &Dom) -> bool {
        self.selection
            .is_some_and(|s| !s.range.text(dom).trim().is_empty())
    }

    fn show(&mut self, viewport: Viewport) {
        if let Some(selection) = self.selection {
            self.toolbar = Some(place_toolbar(selection.rect, viewport, self.toolbar_height));
        }
    }

    /// Debounced selection change.
    pub fn settled(&mut self, dom: &Dom, state: EffectState, viewport: Viewport) {
        if state != EffectState::EnabledSelection {
            return;
        }
        if self.has_text(dom) {
            self.show(viewport);
        } else {
            self.hide();
        }
    }

    /// Click anywhere. Outside the toolbar it hides when there is nothing
    /// selected or the page is disabled.
    pub fn click(&mut self, dom: &Dom, state: EffectState, inside_toolbar: bool) {
        if inside_toolbar {
            return;
        }
        if !self.has_text(dom) || state == EffectState::Disabled {
            self.hide();
        }
    }

    /// Keep a visible toolbar attached to the selection while scrolling.
    pub fn scroll(&mut self, dom: &Dom, state: EffectState, viewport: Viewport) {
        if state == EffectState::Disabled || self.toolbar.is_none() {
            return;
        }
        if self.has_text(dom) {
            self.show(viewport);
        }
    }

    /// Replace the selected content by its emphasized copy, then clear the
    /// selection. Returns wrappers created.
    pub fn transform_selection(&mut self, controller: &EffectController, dom: &mut Dom) -> usize {
        if controller.effect_state() != EffectState::EnabledSelection {
            return 0;
        }
        let Some(selection) = self.selection.take() else {
            return 0;
        };
        self.hide();
        if selection.range.is_collapsed() {
            return 0;
        }

        // existing wrappers touched by the range are redone whole
        let split = widen_over_markers(dom, selection.range).split(dom);
        let container = dom.create_html_element("div", &[]);
        split.clone_contents_into(dom, container);
        Walker::remove_effects(dom, container);
        let wrapped = controller.apply_detached(dom, container);
        let at = split.delete_contents(dom);
        at.splice_children(dom, container);

        debug!(wrapped, "transformed selection");
        wrapped
    }
}

/// Move each end of `range` out to the outermost wrapper it falls inside.
fn widen_over_markers(dom: &Dom, range: Range) -> Range {
    let start = enclosing_marker(dom, range.start.node)
        .map_or(range.start, |marker| child_boundary(dom, marker, 0));
    let end = enclosing_marker(dom, range.end.node)
        .map_or(range.end, |marker| child_boundary(dom, marker, 1));
    Range::new(start, end)
}

/// Boundary just before (`after == 0`) or just after (`after == 1`) `child`.
fn child_boundary(dom: &Dom, child: NodeId, after: usize) -> Boundary {
    let parent = dom.parent(child);
    let index = dom.children(parent).position(|c| c == child).unwrap_or(0);
    Boundary::new(parent, index + after)
}
