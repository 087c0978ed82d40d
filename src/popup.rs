//! Popup-side preferences: reads and writes the store, and says which command
//! the active page should receive.

use url::Url;

use crate::command::Command;
use crate::effect::{ForcedList, ProcessingMode};
use crate::error::Result;
use crate::intensity::IntensityLevel;
use crate::store::SettingsStore;

/// What the popup shows for the active page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupView {
    pub enabled: bool,
    /// The switch cannot be flipped while the host is on a list.
    pub locked: bool,
    pub level: IntensityLevel,
    pub mode: ProcessingMode,
    pub list: ForcedList,
}

pub struct Popup<S: SettingsStore> {
    store: S,
    host: String,
    view: PopupView,
}

impl<S: SettingsStore> Popup<S> {
    /// Open the popup for the page at `url`.
    pub fn open(store: S, url: &str) -> Result<Self> {
        let host = Url::parse(url)?.host_str().unwrap_or_default().to_string();
        let settings = store.load();
        let list = settings.forced_list(&host);
        let profile = settings.domain_settings.get(&host);

        let level = match profile {
            Some(p) => p.bold_level,
            None => settings.bold_level.unwrap_or_default(),
        };
        let enabled = match list {
            ForcedList::Blacklisted => false,
            ForcedList::Whitelisted => true,
            ForcedList::None => profile.map_or(settings.enabled, |p| p.enabled),
        };

        Ok(Self {
            view: PopupView {
                enabled,
                locked: list != ForcedList::None,
                level,
                mode: settings.mode,
                list,
            },
            store,
            host,
        })
    }

    pub fn view(&self) -> PopupView {
        self.view
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Flip the switch. Records the global flag. `None` while locked.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<Option<Command>> {
        if self.view.locked {
            return Ok(None);
        }
        self.store.update(|s| s.enabled = enabled)?;
        self.view.enabled = enabled;
        Ok(Some(Command::Toggle {
            enabled,
            mode: Some(self.view.mode),
            is_whitelisted: None,
            is_blacklisted: None,
        }))
    }

    /// Pick a level. The page only hears about it while enabled.
    pub fn set_level(&mut self, level: IntensityLevel) -> Result<Option<Command>> {
        self.store.update(|s| {
            s.bold_level = Some(level);
            s.last_used_level = Some(level);
        })?;
        self.view.level = level;
        Ok(self
            .view
            .enabled
            .then_some(Command::ChangeBoldLevel { level }))
    }

    /// Pick a mode. The page only hears about it while enabled.
    pub fn set_mode(&mut self, mode: ProcessingMode) -> Result<Option<Command>> {
        self.store.update(|s| s.mode = mode)?;
        self.view.mode = mode;
        Ok(self.view.enabled.then_some(Command::ChangeMode { mode }))
    }

    /// Whitelist the host and force the page on. `None` if already listed.
    pub fn add_to_whitelist(&mut self) -> Result<Option<Command>> {
        let host = self.host.clone();
        if !self.store.update(|s| s.add_to_whitelist(&host))? {
            return Ok(None);
        }
        self.relist(ForcedList::Whitelisted, true);
        Ok(Some(self.list_toggle(true, Some(true), None)))
    }

    /// Blacklist the host and force the page off. `None` if already listed.
    pub fn add_to_blacklist(&mut self) -> Result<Option<Command>> {
        let host = self.host.clone();
        if !self.store.update(|s| s.add_to_blacklist(&host))? {
            return Ok(None);
        }
        self.relist(ForcedList::Blacklisted, false);
        Ok(Some(self.list_toggle(false, None, Some(true))))
    }

    /// Take the host off both lists; the page follows the switch again.
    pub fn remove_from_lists(&mut self) -> Result<Command> {
        let host = self.host.clone();
        self.store.update(|s| s.remove_from_lists(&host))?;
        self.view.list = ForcedList::None;
        self.view.locked = false;
        Ok(self.list_toggle(self.view.enabled, Some(false), Some(false)))
    }

    fn relist(&mut self, list: ForcedList, enabled: bool) {
        self.view.list = list;
        self.view.locked = true;
        self.view.enabled = enabled;
    }

    fn list_toggle(
        &self,
        enabled: bool,
        is_whitelisted: Option<bool>,
        is_blacklisted: Option<bool>,
    ) -> Command {
        Command::Toggle {
            enabled,
            mode: Some(self.view.mode),
            is_whitelisted,
            is_blacklisted,
        }
    }
}
