//! Keeping late content in step: subtree insertions and same-document navigation.

use tracing::debug;

use crate::classify::MARKER_CLASS;
use crate::dom::{Dom, NodeId};
use crate::effect::{EffectController, EffectState};

/// Delay between a navigation and the document-wide re-apply.
pub const NAVIGATION_SETTLE_MS: u64 = 500;

/// Receiver of document change notifications, in delivery order.
pub trait DocumentObserver {
    /// A batch of nodes was inserted somewhere in the document.
    fn subtree_inserted(&mut self, nodes: &[NodeId]);

    /// The document's URL changed without a reload.
    fn navigated(&mut self, url: &str);
}

/// What a navigation asks of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Same URL, or nothing to do while disabled.
    Ignored,
    /// Re-apply after the given delay, if still fully enabled then.
    Settle { delay_ms: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct MutationWatcher {
    settle_ms: u64,
}

impl Default for MutationWatcher {
    fn default() -> Self {
        Self::new(NAVIGATION_SETTLE_MS)
    }
}

impl MutationWatcher {
    pub fn new(settle_ms: u64) -> Self {
        Self { settle_ms }
    }

    /// Apply to each inserted, attached element that is not itself a wrapper.
    /// Returns wrappers created.
    pub fn inserted(&self, controller: &EffectController, dom: &mut Dom, nodes: &[NodeId]) -> usize {
        if controller.effect_state() != EffectState::EnabledFull {
            return 0;
        }

        let mut wrapped = 0;
        for &node in nodes {
            if !dom.is_element(node) || dom.has_class(node, MARKER_CLASS) || !dom.is_attached(node) {
                continue;
            }
            wrapped += controller.apply(dom, node);
        }
        if wrapped > 0 {
            debug!(inserted = nodes.len(), wrapped, "processed inserted content");
        }
        wrapped
    }

    pub fn navigated(&self, controller: &mut EffectController, url: &str) -> Navigation {
        if !controller.navigate(url) {
            return Navigation::Ignored;
        }
        debug!(url, "navigation");
        if controller.effect_state() == EffectState::Disabled {
            return Navigation::Ignored;
        }
        Navigation::Settle {
            delay_ms: self.settle_ms,
        }
    }

    /// Settle timer fired: re-apply the whole document if still fully enabled.
    pub fn settled(&self, controller: &EffectController, dom: &mut Dom) -> usize {
        controller.apply_document(dom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::dom::parse_html;
    use crate::effect::{DocumentRuntimeState, ForcedList, ProcessingMode};
    use crate::intensity::IntensityLevel;
    use crate::walker::{Walker, count_markers};

    fn controller(enabled: bool, mode: ProcessingMode) -> EffectController {
        let state = DocumentRuntimeState {
            enabled,
            level: IntensityLevel::Focus,
            mode,
            current_url: "https://example.com/a".to_string(),
        };
        EffectController::new(
            state,
            ForcedList::None,
            Walker::new(Classifier::standard().unwrap(), IntensityLevel::Focus),
        )
    }

    fn insert(dom: &mut Dom, html_text: &str) -> NodeId {
        let div = dom.create_html_element("div", &[]);
        let text = dom.create_text(html_text);
        dom.append(div, text);
        let body = dom.body();
        dom.append(body, div);
        div
    }

    #[test]
    fn test_inserted_elements_are_processed() {
        let mut dom = parse_html("<p>old</p>");
        let c = controller(true, ProcessingMode::Full);
        let watcher = MutationWatcher::default();
        let div = insert(&mut dom, "late content");
        let text = dom.create_text("bare text");
        let body = dom.body();
        dom.append(body, text);

        assert_eq!(watcher.inserted(&c, &mut dom, &[div, text]), 1);
        assert_eq!(count_markers(&dom, div), 1);
        // the old paragraph is not part of the batch
        assert_eq!(count_markers(&dom, dom.find_by_tag("p").unwrap()), 0);
    }

    #[test]
    fn test_inserted_ignored_unless_full() {
        let mut dom = parse_html("");
        let watcher = MutationWatcher::default();
        let div = insert(&mut dom, "late content");
        for c in [
            controller(false, ProcessingMode::Full),
            controller(true, ProcessingMode::Selection),
        ] {
            assert_eq!(watcher.inserted(&c, &mut dom, &[div]), 0);
        }
    }

    #[test]
    fn test_inserted_wrappers_and_detached_nodes_are_skipped() {
        let mut dom = parse_html("");
        let c = controller(true, ProcessingMode::Full);
        let watcher = MutationWatcher::default();
        let wrapper = insert(&mut dom, "already done");
        dom.add_class(wrapper, MARKER_CLASS);
        let detached = dom.create_html_element("p", &[]);
        let text = dom.create_text("gone");
        dom.append(detached, text);
        assert_eq!(watcher.inserted(&c, &mut dom, &[wrapper, detached]), 0);
    }

    #[test]
    fn test_navigation() {
        let watcher = MutationWatcher::default();
        let mut c = controller(true, ProcessingMode::Full);
        assert_eq!(watcher.navigated(&mut c, "https://example.com/a"), Navigation::Ignored);
        assert_eq!(
            watcher.navigated(&mut c, "https://example.com/b"),
            Navigation::Settle { delay_ms: 500 }
        );

        let mut off = controller(false, ProcessingMode::Full);
        assert_eq!(watcher.navigated(&mut off, "https://example.com/b"), Navigation::Ignored);
        assert_eq!(off.state().current_url, "https://example.com/b");
    }
}
