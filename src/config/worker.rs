use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Memory lifecycle of per-key state.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvictionPolicy {
    /// Key state lives for the whole engine lifetime
    #[default]
    None,
    /// Key state is dropped right after each release; the next event reloads the balance
    AfterRelease,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Number of partitions, one thread each. Fixed for the engine lifetime
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Starting balance of a key when no balance loader is configured
    #[serde(default)]
    pub default_balance: i64,

    #[serde(default)]
    pub eviction_policy: EvictionPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            default_balance: 0,
            eviction_policy: EvictionPolicy::default(),
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::Config(ConfigError::Message(
                "worker_count must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_worker_count() -> usize {
    1
}
