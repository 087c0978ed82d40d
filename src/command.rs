//! Messages between the background, the popup and a page.
//!
//! Commands travel as JSON objects tagged by `action`:
//!
//! ```
//! use bionic::command::Command;
//! use bionic::IntensityLevel;
//!
//! let cmd: Command = serde_json::from_str(r#"{"action":"changeBoldLevel","level":"Deep"}"#).unwrap();
//! assert_eq!(cmd, Command::ChangeBoldLevel { level: IntensityLevel::Deep });
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effect::ProcessingMode;
use crate::error::Result;
use crate::intensity::IntensityLevel;
use crate::store::Settings;
use crate::timer::Timeline;

/// Wait before the single redelivery attempt.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Completed loads closer together than this are treated as one.
pub const LOAD_DEDUP_MS: u64 = 1000;

/// Wait between a completed load and the enable command.
pub const LOAD_SETTLE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    Toggle {
        enabled: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<ProcessingMode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_whitelisted: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_blacklisted: Option<bool>,
    },
    ChangeMode {
        mode: ProcessingMode,
    },
    ChangeBoldLevel {
        level: IntensityLevel,
    },
}

impl Command {
    /// Plain `toggle` without mode or list flags.
    pub fn toggle(enabled: bool) -> Self {
        Self::Toggle {
            enabled,
            mode: None,
            is_whitelisted: None,
            is_blacklisted: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Something commands can be delivered to.
pub trait Recipient {
    /// Fails with [`crate::Error::NotReady`] while the recipient cannot
    /// take commands yet.
    fn deliver(&mut self, command: &Command) -> Result<()>;
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    RetryScheduled,
    Dropped,
}

#[derive(Debug, Clone)]
enum Outbound {
    First(Command),
    Retry(Command),
}

/// Sends commands, retrying a failed delivery once.
#[derive(Debug)]
pub struct Courier {
    timeline: Timeline<Outbound>,
    retry_delay_ms: u64,
}

impl Default for Courier {
    fn default() -> Self {
        Self::new(RETRY_DELAY_MS)
    }
}

impl Courier {
    pub fn new(retry_delay_ms: u64) -> Self {
        Self {
            timeline: Timeline::new(),
            retry_delay_ms,
        }
    }

    pub fn now(&self) -> u64 {
        self.timeline.now()
    }

    /// Deliveries and retries still waiting.
    pub fn pending(&self) -> usize {
        self.timeline.len()
    }

    /// Attempt delivery now.
    pub fn send(&mut self, recipient: &mut impl Recipient, command: Command) -> Delivery {
        self.attempt(recipient, Outbound::First(command))
    }

    /// First attempt after `delay_ms`.
    pub fn send_after(&mut self, delay_ms: u64, command: Command) {
        self.timeline.schedule(delay_ms, Outbound::First(command));
    }

    /// Move time forward, attempting whatever came due.
    pub fn advance(&mut self, recipient: &mut impl Recipient, ms: u64) -> Vec<Delivery> {
        let target = self.timeline.now().saturating_add(ms);
        let mut outcomes = Vec::new();
        while let Some(outbound) = self.timeline.pop_due(target) {
            outcomes.push(self.attempt(recipient, outbound));
        }
        self.timeline.skip_to(target);
        outcomes
    }

    fn attempt(&mut self, recipient: &mut impl Recipient, outbound: Outbound) -> Delivery {
        let (command, is_retry) = match outbound {
            Outbound::First(command) => (command, false),
            Outbound::Retry(command) => (command, true),
        };
        match recipient.deliver(&command) {
            Ok(()) => Delivery::Delivered,
            Err(e) if is_retry => {
                debug!(error = %e, ?command, "dropping command after retry");
                Delivery::Dropped
            }
            Err(e) => {
                debug!(error = %e, "delivery failed, retrying");
                self.timeline
                    .schedule(self.retry_delay_ms, Outbound::Retry(command));
                Delivery::RetryScheduled
            }
        }
    }
}

/// Background reaction to completed page loads.
#[derive(Debug, Default)]
pub struct TabWatcher {
    last_processed: Option<u64>,
}

impl TabWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page finished loading. Queues an enable command when the global
    /// switch is on. Returns whether the load was acted upon.
    pub fn page_loaded(&mut self, settings: &Settings, courier: &mut Courier) -> bool {
        let now = courier.now();
        if let Some(last) = self.last_processed
            && now.saturating_sub(last) < LOAD_DEDUP_MS
        {
            return false;
        }
        self.last_processed = Some(now);

        if !settings.enabled {
            return false;
        }
        courier.send_after(LOAD_SETTLE_MS, Command::toggle(true));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Refuses the first `failures_left` deliveries.
    #[derive(Default)]
    struct Flaky {
        failures_left: usize,
        received: Vec<Command>,
    }

    impl Recipient for Flaky {
        fn deliver(&mut self, command: &Command) -> Result<()> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(Error::NotReady);
            }
            self.received.push(command.clone());
            Ok(())
        }
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{"action":"toggle","enabled":true,"mode":"selection","isWhitelisted":true}"#;
        let cmd = Command::from_json(json).unwrap();
        assert_eq!(
            cmd,
            Command::Toggle {
                enabled: true,
                mode: Some(ProcessingMode::Selection),
                is_whitelisted: Some(true),
                is_blacklisted: None,
            }
        );
        assert_eq!(cmd.to_json().unwrap(), json);

        let mode = Command::from_json(r#"{"action":"changeMode","mode":"full","enabled":true}"#);
        assert_eq!(mode.unwrap(), Command::ChangeMode { mode: ProcessingMode::Full });

        assert!(Command::from_json(r#"{"action":"explode"}"#).is_err());
        assert!(Command::from_json(r#"{"action":"changeBoldLevel","level":"Max"}"#).is_err());
    }

    #[test]
    fn test_retry_once_then_deliver() {
        let mut courier = Courier::default();
        let mut page = Flaky {
            failures_left: 1,
            ..Flaky::default()
        };
        assert_eq!(courier.send(&mut page, Command::toggle(true)), Delivery::RetryScheduled);
        assert!(courier.advance(&mut page, 999).is_empty());
        assert_eq!(courier.advance(&mut page, 1), [Delivery::Delivered]);
        assert_eq!(page.received, [Command::toggle(true)]);
    }

    #[test]
    fn test_second_failure_drops() {
        let mut courier = Courier::default();
        let mut page = Flaky {
            failures_left: 5,
            ..Flaky::default()
        };
        courier.send(&mut page, Command::toggle(false));
        assert_eq!(courier.advance(&mut page, 5000), [Delivery::Dropped]);
        assert_eq!(courier.pending(), 0);
        assert!(page.received.is_empty());
    }

    #[test]
    fn test_tab_watcher() {
        let mut courier = Courier::default();
        let mut watcher = TabWatcher::new();
        let mut page = Flaky::default();
        let settings = Settings {
            enabled: true,
            ..Settings::default()
        };

        assert!(watcher.page_loaded(&settings, &mut courier));
        // a second completion inside the window is ignored
        courier.advance(&mut page, 400);
        assert!(!watcher.page_loaded(&settings, &mut courier));

        assert_eq!(courier.advance(&mut page, 100), [Delivery::Delivered]);
        assert_eq!(page.received, [Command::toggle(true)]);

        courier.advance(&mut page, 1000);
        assert!(!watcher.page_loaded(&Settings::default(), &mut courier));
        assert_eq!(courier.pending(), 0);
    }
}
