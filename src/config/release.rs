use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// What triggers the release of a key's pending events.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseTrigger {
    /// Release a key as soon as its pending event count reaches the threshold
    #[default]
    Count,
    /// Release every pending key on a fixed interval
    Time,
    /// Count threshold and interval, whichever comes first
    Hybrid,
}

impl ReleaseTrigger {
    pub fn uses_threshold(self) -> bool {
        matches!(self, ReleaseTrigger::Count | ReleaseTrigger::Hybrid)
    }

    pub fn uses_interval(self) -> bool {
        matches!(self, ReleaseTrigger::Time | ReleaseTrigger::Hybrid)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    #[serde(default)]
    pub policy: ReleaseTrigger,

    /// Pending events per key that trigger a release under COUNT/HYBRID.
    /// Zero releases on every applied event.
    #[serde(default = "default_threshold")]
    pub threshold: u64,

    /// Flush-all period in milliseconds, required for TIME/HYBRID
    #[serde(default)]
    pub interval_ms: Option<u64>,

    /// Upper bound shutdown waits for the release scheduler thread to exit
    #[serde(default = "default_scheduler_shutdown_timeout_ms")]
    pub scheduler_shutdown_timeout_ms: u64,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            policy: ReleaseTrigger::default(),
            threshold: default_threshold(),
            interval_ms: None,
            scheduler_shutdown_timeout_ms: default_scheduler_shutdown_timeout_ms(),
        }
    }
}

impl ReleaseConfig {
    pub fn validate(&self) -> Result<()> {
        match self.interval_ms {
            Some(0) => {
                return Err(Error::Config(ConfigError::Message(
                    "interval_ms must be greater than 0".into(),
                )));
            }
            None if self.policy.uses_interval() => {
                return Err(Error::Config(ConfigError::Message(format!(
                    "interval_ms is required for the {:?} release policy",
                    self.policy
                ))));
            }
            _ => {}
        }

        if self.scheduler_shutdown_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "scheduler_shutdown_timeout_ms must be greater than 0".into(),
            )));
        }
        Ok(())
    }

    /// Flush-all period, present only when the policy runs a scheduler.
    pub fn interval(&self) -> Option<Duration> {
        if !self.policy.uses_interval() {
            return None;
        }
        self.interval_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    pub fn scheduler_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.scheduler_shutdown_timeout_ms)
    }
}

fn default_threshold() -> u64 {
    1000
}

fn default_scheduler_shutdown_timeout_ms() -> u64 {
    5000
}
