//! Persisted settings: global preferences, per-domain profiles, and the
//! whitelist / blacklist.
//!
//! The stored shape is a flat JSON object with camelCase keys. Missing keys
//! fall back to defaults; a corrupt store reads as empty.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::effect::{DocumentRuntimeState, ForcedList, ProcessingMode};
use crate::error::{Error, Result};
use crate::intensity::IntensityLevel;

/// Domain profiles retained; the least recently used go first.
pub const MAX_DOMAIN_PROFILES: usize = 100;

/// Saved state for one host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainProfile {
    pub enabled: bool,
    pub bold_level: IntensityLevel,
    /// Milliseconds since the Unix epoch.
    pub last_used: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Global switch, used for hosts without a profile.
    pub enabled: bool,
    pub bold_level: Option<IntensityLevel>,
    pub last_used_level: Option<IntensityLevel>,
    pub mode: ProcessingMode,
    pub domain_settings: BTreeMap<String, DomainProfile>,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl Settings {
    /// Starting state for a document on `host`.
    pub fn seed(&self, host: &str, url: &str) -> DocumentRuntimeState {
        let (enabled, level) = match self.domain_settings.get(host) {
            Some(profile) => (profile.enabled, profile.bold_level),
            None => (
                self.enabled,
                self.last_used_level.or(self.bold_level).unwrap_or_default(),
            ),
        };
        DocumentRuntimeState {
            enabled,
            level,
            mode: self.mode,
            current_url: url.to_string(),
        }
    }

    /// List membership of `host`; the blacklist wins.
    pub fn forced_list(&self, host: &str) -> ForcedList {
        ForcedList::from_flags(
            self.whitelist.iter().any(|h| h == host),
            self.blacklist.iter().any(|h| h == host),
        )
    }

    /// Write the durable projection of `state` for `host`, stamped `now`.
    pub fn record(&mut self, host: &str, state: &DocumentRuntimeState, now: u64) {
        self.save_profile(
            host,
            DomainProfile {
                enabled: state.enabled,
                bold_level: state.level,
                last_used: now,
            },
        );
        self.last_used_level = Some(state.level);
        self.mode = state.mode;
    }

    /// Insert or replace a profile, then evict down to
    /// [`MAX_DOMAIN_PROFILES`]. Returns the evicted hosts.
    pub fn save_profile(&mut self, host: &str, profile: DomainProfile) -> Vec<String> {
        self.domain_settings.insert(host.to_string(), profile);
        if self.domain_settings.len() <= MAX_DOMAIN_PROFILES {
            return Vec::new();
        }

        let mut by_recency: Vec<(&String, u64)> = self
            .domain_settings
            .iter()
            .map(|(host, p)| (host, p.last_used))
            .collect();
        by_recency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let evicted: Vec<String> = by_recency[MAX_DOMAIN_PROFILES..]
            .iter()
            .map(|(host, _)| (*host).clone())
            .collect();

        for host in &evicted {
            self.domain_settings.remove(host);
        }
        debug!(?evicted, "evicted domain profiles");
        evicted
    }

    /// Add `host` to the whitelist. False if it was already there.
    pub fn add_to_whitelist(&mut self, host: &str) -> bool {
        add_unique(&mut self.whitelist, host)
    }

    /// Add `host` to the blacklist. False if it was already there.
    pub fn add_to_blacklist(&mut self, host: &str) -> bool {
        add_unique(&mut self.blacklist, host)
    }

    /// Drop `host` from both lists.
    pub fn remove_from_lists(&mut self, host: &str) {
        self.whitelist.retain(|h| h != host);
        self.blacklist.retain(|h| h != host);
    }
}

fn add_unique(list: &mut Vec<String>, host: &str) -> bool {
    if list.iter().any(|h| h == host) {
        return false;
    }
    list.push(host.to_string());
    true
}

/// Durable backing for [`Settings`].
pub trait SettingsStore {
    /// Current settings. Never fails: an absent or unreadable store reads as
    /// the defaults.
    fn load(&self) -> Settings;

    fn save(&mut self, settings: &Settings) -> Result<()>;

    /// Load, change, save.
    fn update<R>(&mut self, change: impl FnOnce(&mut Settings) -> R) -> Result<R>
    where
        Self: Sized,
    {
        let mut settings = self.load();
        let result = change(&mut settings);
        self.save(&settings)?;
        Ok(result)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    settings: Settings,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Settings {
        self.settings.clone()
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        self.settings = settings.clone();
        Ok(())
    }
}

/// Settings kept in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Settings> {
        let data = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Settings {
        match self.read() {
            Ok(settings) => settings,
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable settings, using defaults");
                Settings::default()
            }
        }
    }

    fn save(&mut self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(last_used: u64) -> DomainProfile {
        DomainProfile {
            enabled: true,
            bold_level: IntensityLevel::Focus,
            last_used,
        }
    }

    #[test]
    fn test_defaults_from_empty_object() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        let state = settings.seed("example.com", "https://example.com/");
        assert!(!state.enabled);
        assert_eq!(state.level, IntensityLevel::Focus);
        assert_eq!(state.mode, ProcessingMode::Full);
    }

    #[test]
    fn test_storage_keys() {
        let json = r#"{
            "enabled": true,
            "boldLevel": "Glance",
            "lastUsedLevel": "Deep",
            "mode": "selection",
            "domainSettings": {
                "news.example": {"enabled": false, "boldLevel": "Glance", "lastUsed": 17}
            },
            "whitelist": ["docs.rs"],
            "blacklist": ["bank.example"]
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        let known = settings.seed("news.example", "https://news.example/");
        assert!(!known.enabled);
        assert_eq!(known.level, IntensityLevel::Glance);
        assert_eq!(known.mode, ProcessingMode::Selection);

        let fresh = settings.seed("other.example", "https://other.example/");
        assert!(fresh.enabled);
        assert_eq!(fresh.level, IntensityLevel::Deep);

        assert_eq!(settings.forced_list("docs.rs"), ForcedList::Whitelisted);
        assert_eq!(settings.forced_list("bank.example"), ForcedList::Blacklisted);
        assert_eq!(settings.forced_list("other.example"), ForcedList::None);
    }

    #[test]
    fn test_level_fallback_order() {
        let settings = Settings {
            bold_level: Some(IntensityLevel::Glance),
            ..Settings::default()
        };
        assert_eq!(settings.seed("h", "").level, IntensityLevel::Glance);
    }

    #[test]
    fn test_eviction_removes_least_recent() {
        let mut settings = Settings::default();
        for i in 0..MAX_DOMAIN_PROFILES as u64 {
            // host-0 is the oldest
            assert!(settings.save_profile(&format!("host-{i}"), profile(1000 + i)).is_empty());
        }
        assert_eq!(settings.domain_settings.len(), MAX_DOMAIN_PROFILES);

        let evicted = settings.save_profile("newcomer", profile(5000));
        assert_eq!(evicted, ["host-0"]);
        assert_eq!(settings.domain_settings.len(), MAX_DOMAIN_PROFILES);
        assert!(settings.domain_settings.contains_key("newcomer"));
        assert!(!settings.domain_settings.contains_key("host-0"));
    }

    #[test]
    fn test_resaving_refreshes_recency() {
        let mut settings = Settings::default();
        for i in 0..MAX_DOMAIN_PROFILES as u64 {
            settings.save_profile(&format!("host-{i}"), profile(1000 + i));
        }
        settings.save_profile("host-0", profile(9000));
        let evicted = settings.save_profile("newcomer", profile(9001));
        assert_eq!(evicted, ["host-1"]);
    }

    #[test]
    fn test_record_updates_globals() {
        let mut settings = Settings::default();
        let state = DocumentRuntimeState {
            enabled: true,
            level: IntensityLevel::Deep,
            mode: ProcessingMode::Selection,
            current_url: String::new(),
        };
        settings.record("example.com", &state, 42);
        assert_eq!(settings.domain_settings["example.com"], DomainProfile {
            enabled: true,
            bold_level: IntensityLevel::Deep,
            last_used: 42,
        });
        assert_eq!(settings.last_used_level, Some(IntensityLevel::Deep));
        assert_eq!(settings.mode, ProcessingMode::Selection);
    }

    #[test]
    fn test_list_crud() {
        let mut settings = Settings::default();
        assert!(settings.add_to_whitelist("a.example"));
        assert!(!settings.add_to_whitelist("a.example"));
        assert!(settings.add_to_blacklist("a.example"));
        assert_eq!(settings.forced_list("a.example"), ForcedList::Blacklisted);
        settings.remove_from_lists("a.example");
        assert!(settings.whitelist.is_empty() && settings.blacklist.is_empty());
    }

    #[test]
    fn test_memory_store_update() {
        let mut store = MemoryStore::default();
        let added = store.update(|s| s.add_to_whitelist("x.example")).unwrap();
        assert!(added);
        assert_eq!(store.load().whitelist, ["x.example"]);
    }
}
