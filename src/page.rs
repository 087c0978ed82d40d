//! A loaded document and everything acting on it.
//!
//! [`Page`] is the content-side host. It owns the tree, the settings store and
//! a virtual timeline, and routes host events (commands, insertions,
//! navigation, selection, clicks, scrolls, clock ticks) to the components.
//! Failures stop at this boundary: they are logged and the page carries on.

use tracing::{debug, warn};
use url::Url;

use crate::classify::{Classifier, PageContext};
use crate::command::{Command, Recipient};
use crate::dom::{Dom, NodeId};
use crate::effect::{DocumentRuntimeState, EffectController, EffectState, Transition};
use crate::error::{Error, Result};
use crate::selection::{
    SELECTION_DEBOUNCE_MS, Selection, SelectionController, ToolbarPlacement, Viewport,
};
use crate::store::SettingsStore;
use crate::timer::{Debounce, Timeline};
use crate::util::time_now_millis;
use crate::walker::Walker;
use crate::watch::{DocumentObserver, MutationWatcher, Navigation};

/// Class added to `<body>` when a page loads enabled.
pub const ACTIVE_CLASS: &str = "bionic-active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageTask {
    SelectionSettled,
    NavigationSettled,
}

pub struct Page<S: SettingsStore> {
    dom: Dom,
    store: S,
    url: String,
    host: String,
    controller: Option<EffectController>,
    watcher: MutationWatcher,
    selection: SelectionController,
    debounce: Debounce,
    timeline: Timeline<PageTask>,
    viewport: Viewport,
}

impl<S: SettingsStore> Page<S> {
    pub fn new(dom: Dom, url: &str, store: S) -> Result<Self> {
        let host = Url::parse(url)?.host_str().unwrap_or_default().to_string();
        Ok(Self {
            dom,
            store,
            url: url.to_string(),
            host,
            controller: None,
            watcher: MutationWatcher::default(),
            selection: SelectionController::default(),
            debounce: Debounce::new(),
            timeline: Timeline::new(),
            viewport: Viewport::default(),
        })
    }

    /// Seed state from the store and apply if enabled. Commands are refused
    /// until this has run.
    pub fn load(&mut self) -> Result<()> {
        let settings = self.store.load();
        let state = settings.seed(&self.host, &self.url);
        let forced = settings.forced_list(&self.host);

        let context = PageContext::from_url(&self.url)?;
        let walker = Walker::new(Classifier::new(context)?, state.level);
        let controller = EffectController::new(state, forced, walker);

        if controller.state().enabled {
            let body = self.dom.body();
            if self.dom.is_element(body) {
                self.dom.add_class(body, ACTIVE_CLASS);
            }
            let wrapped = controller.apply_document(&mut self.dom);
            debug!(host = %self.host, wrapped, "loaded enabled");
        }
        let enabled = controller.state().enabled;
        self.controller = Some(controller);
        if enabled {
            self.persist();
        }
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.controller.is_some()
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Mutable tree access for the host's own edits. Report insertions
    /// through [`DocumentObserver::subtree_inserted`].
    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn into_dom(self) -> Dom {
        self.dom
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn state(&self) -> Option<&DocumentRuntimeState> {
        self.controller.as_ref().map(EffectController::state)
    }

    pub fn effect_state(&self) -> Option<EffectState> {
        self.controller.as_ref().map(EffectController::effect_state)
    }

    pub fn toolbar(&self) -> Option<ToolbarPlacement> {
        self.selection.toolbar()
    }

    pub fn now(&self) -> u64 {
        self.timeline.now()
    }

    /// Run one command.
    pub fn handle(&mut self, command: &Command) -> Result<Transition> {
        let controller = self.controller.as_mut().ok_or(Error::NotReady)?;
        let transition = match *command {
            Command::Toggle {
                enabled,
                mode,
                is_whitelisted,
                is_blacklisted,
            } => controller.toggle(&mut self.dom, enabled, mode, is_whitelisted, is_blacklisted),
            Command::ChangeMode { mode } => {
                let transition = controller.set_mode(&mut self.dom, mode);
                if transition.after != EffectState::Disabled {
                    self.selection.hide();
                }
                transition
            }
            Command::ChangeBoldLevel { level } => controller.set_level(&mut self.dom, level),
        };

        if transition.after != EffectState::EnabledSelection {
            self.selection.hide();
        }
        if transition.persist {
            self.persist();
        }
        Ok(transition)
    }

    fn persist(&mut self) {
        let Some(controller) = &self.controller else {
            return;
        };
        let state = controller.state().clone();
        let host = self.host.clone();
        if let Err(e) = self
            .store
            .update(|settings| settings.record(&host, &state, time_now_millis()))
        {
            warn!(host = %host, error = %e, "failed to save domain profile");
        }
    }

    /// The user's selection changed. Handled after the debounce delay.
    pub fn selection_changed(&mut self, selection: Option<Selection>) {
        self.selection.select(selection);
        self.debounce
            .arm(&mut self.timeline, SELECTION_DEBOUNCE_MS, PageTask::SelectionSettled);
    }

    pub fn click(&mut self, inside_toolbar: bool) {
        let state = self.effect_state().unwrap_or(EffectState::Disabled);
        self.selection.click(&self.dom, state, inside_toolbar);
    }

    pub fn scroll(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let state = self.effect_state().unwrap_or(EffectState::Disabled);
        self.selection.scroll(&self.dom, state, viewport);
    }

    /// The toolbar's action: emphasize the current selection.
    pub fn transform_selection(&mut self) -> usize {
        match &self.controller {
            Some(controller) => self.selection.transform_selection(controller, &mut self.dom),
            None => 0,
        }
    }

    /// Move the clock forward and run whatever came due.
    pub fn advance(&mut self, ms: u64) {
        let target = self.timeline.now().saturating_add(ms);
        while let Some(task) = self.timeline.pop_due(target) {
            self.run(task);
        }
        self.timeline.skip_to(target);
    }

    fn run(&mut self, task: PageTask) {
        let Some(controller) = &self.controller else {
            return;
        };
        match task {
            PageTask::SelectionSettled => {
                self.debounce.settle();
                self.selection
                    .settled(&self.dom, controller.effect_state(), self.viewport);
            }
            PageTask::NavigationSettled => {
                self.watcher.settled(controller, &mut self.dom);
            }
        }
    }
}

impl<S: SettingsStore> DocumentObserver for Page<S> {
    fn subtree_inserted(&mut self, nodes: &[NodeId]) {
        if let Some(controller) = &self.controller {
            self.watcher.inserted(controller, &mut self.dom, nodes);
        }
    }

    fn navigated(&mut self, url: &str) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        if let Navigation::Settle { delay_ms } = self.watcher.navigated(controller, url) {
            self.timeline.schedule(delay_ms, PageTask::NavigationSettled);
        }
        self.url = url.to_string();
    }
}

impl<S: SettingsStore> Recipient for Page<S> {
    fn deliver(&mut self, command: &Command) -> Result<()> {
        self.handle(command).map(|_| ())
    }
}
