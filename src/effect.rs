//! Enabled / mode / level state machine and the document-wide passes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::PageContext;
use crate::dom::{Dom, NodeId};
use crate::error::Error;
use crate::intensity::IntensityLevel;
use crate::walker::Walker;

/// Where emphasis is applied while enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Whole document, including content inserted later.
    #[default]
    Full,
    /// Only text the user selects and asks for.
    Selection,
}

impl ProcessingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Selection => "selection",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "selection" => Ok(Self::Selection),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

/// Per-document state, seeded from settings at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRuntimeState {
    pub enabled: bool,
    pub level: IntensityLevel,
    pub mode: ProcessingMode,
    pub current_url: String,
}

impl DocumentRuntimeState {
    pub fn effect_state(&self) -> EffectState {
        match (self.enabled, self.mode) {
            (false, _) => EffectState::Disabled,
            (true, ProcessingMode::Full) => EffectState::EnabledFull,
            (true, ProcessingMode::Selection) => EffectState::EnabledSelection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    Disabled,
    EnabledFull,
    EnabledSelection,
}

/// List membership overriding user toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForcedList {
    #[default]
    None,
    Whitelisted,
    Blacklisted,
}

impl ForcedList {
    pub fn from_flags(whitelisted: bool, blacklisted: bool) -> Self {
        if blacklisted {
            Self::Blacklisted
        } else if whitelisted {
            Self::Whitelisted
        } else {
            Self::None
        }
    }
}

/// Outcome of one state-machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub before: EffectState,
    pub after: EffectState,
    /// Wrappers created by the step.
    pub applied: usize,
    /// Wrappers removed by the step.
    pub removed: usize,
    /// Enabled, mode or level changed; the profile should be written.
    pub persist: bool,
}

#[derive(Debug, Clone)]
pub struct EffectController {
    state: DocumentRuntimeState,
    forced: ForcedList,
    walker: Walker,
}

impl EffectController {
    pub fn new(mut state: DocumentRuntimeState, forced: ForcedList, mut walker: Walker) -> Self {
        match forced {
            ForcedList::Blacklisted => state.enabled = false,
            ForcedList::Whitelisted => state.enabled = true,
            ForcedList::None => {}
        }
        walker.set_level(state.level);
        Self {
            state,
            forced,
            walker,
        }
    }

    pub fn state(&self) -> &DocumentRuntimeState {
        &self.state
    }

    pub fn effect_state(&self) -> EffectState {
        self.state.effect_state()
    }

    pub fn forced(&self) -> ForcedList {
        self.forced
    }

    pub fn walker(&self) -> &Walker {
        &self.walker
    }

    /// Handle a `toggle`. List flags replace the forced state when present;
    /// absent flags keep it.
    pub fn toggle(
        &mut self,
        dom: &mut Dom,
        enabled: bool,
        mode: Option<ProcessingMode>,
        whitelisted: Option<bool>,
        blacklisted: Option<bool>,
    ) -> Transition {
        if whitelisted.is_some() || blacklisted.is_some() {
            self.forced =
                ForcedList::from_flags(whitelisted.unwrap_or(false), blacklisted.unwrap_or(false));
        }
        self.set_enabled(dom, enabled, mode)
    }

    /// Enable or disable, optionally switching mode. A forced list wins over
    /// the requested `enabled`.
    pub fn set_enabled(
        &mut self,
        dom: &mut Dom,
        enabled: bool,
        mode: Option<ProcessingMode>,
    ) -> Transition {
        let enabled = match self.forced {
            ForcedList::Blacklisted => false,
            ForcedList::Whitelisted => true,
            ForcedList::None => enabled,
        };

        self.step(dom, |state| {
            state.enabled = enabled;
            if let Some(mode) = mode {
                state.mode = mode;
            }
        })
    }

    /// Switch mode. While disabled only the preference is recorded.
    pub fn set_mode(&mut self, dom: &mut Dom, mode: ProcessingMode) -> Transition {
        self.step(dom, |state| state.mode = mode)
    }

    /// Switch intensity. While enabled existing emphasis is redone.
    pub fn set_level(&mut self, dom: &mut Dom, level: IntensityLevel) -> Transition {
        self.step(dom, |state| state.level = level)
    }

    fn step(&mut self, dom: &mut Dom, change: impl FnOnce(&mut DocumentRuntimeState)) -> Transition {
        let before_state = self.state.clone();
        let before = before_state.effect_state();
        change(&mut self.state);
        self.walker.set_level(self.state.level);
        let after = self.state.effect_state();

        let level_changed = before_state.level != self.state.level;
        let mut removed = 0;
        let mut applied = 0;

        let redo = before != after || (level_changed && after != EffectState::Disabled);
        if redo {
            if before != EffectState::Disabled {
                removed = self.remove_all(dom);
            }
            if after == EffectState::EnabledFull {
                applied = self.apply_document(dom);
            }
        } else if after == EffectState::EnabledFull {
            // Re-enabling an already enabled page picks up anything missed.
            applied = self.apply_document(dom);
        }

        let persist = before_state.enabled != self.state.enabled
            || before_state.mode != self.state.mode
            || level_changed;

        debug!(?before, ?after, applied, removed, persist, "effect transition");
        Transition {
            before,
            after,
            applied,
            removed,
            persist,
        }
    }

    /// Apply emphasis under `root` when fully enabled. Returns wrappers created.
    pub fn apply(&self, dom: &mut Dom, root: NodeId) -> usize {
        if self.effect_state() != EffectState::EnabledFull {
            return 0;
        }
        self.walker.apply(dom, root)
    }

    pub fn apply_document(&self, dom: &mut Dom) -> usize {
        let root = dom.document();
        self.apply(dom, root)
    }

    /// Apply to a detached subtree regardless of mode; used for selections.
    pub fn apply_detached(&self, dom: &mut Dom, root: NodeId) -> usize {
        if !self.state.enabled {
            return 0;
        }
        self.walker.apply(dom, root)
    }

    /// Remove every wrapper in the document.
    pub fn remove_all(&self, dom: &mut Dom) -> usize {
        let root = dom.document();
        Walker::remove_effects(dom, root)
    }

    /// Record a new URL. Returns false when it matches the current one.
    pub fn navigate(&mut self, url: &str) -> bool {
        if self.state.current_url == url {
            return false;
        }
        match PageContext::from_url(url) {
            Ok(context) => self.walker.set_context(context),
            Err(e) => warn!(url, error = %e, "keeping previous page context"),
        }
        self.state.current_url = url.to_string();
        true
    }
}
