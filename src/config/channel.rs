use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// How idle consumers wait for new events.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceMode {
    /// Idle consumers park on a condition variable
    #[default]
    Standard,
    /// Idle consumers spin and yield; lowest latency, one busy core per consumer
    Maximum,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Number of pre-allocated event slots; a full ring blocks publishers
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    #[serde(default)]
    pub performance_mode: PerformanceMode,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            performance_mode: PerformanceMode::default(),
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.buffer_capacity.is_power_of_two() {
            return Err(Error::Config(ConfigError::Message(format!(
                "buffer_capacity must be a positive power of two, got {}",
                self.buffer_capacity
            ))));
        }
        Ok(())
    }
}

fn default_buffer_capacity() -> usize {
    1024
}
