use std::time::Duration;

use super::ReleasePolicy;

/// Releases a key once its pending event count reaches the threshold.
///
/// A zero threshold releases on every applied event.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CountPolicy {
    threshold: u64,
}

impl CountPolicy {
    pub(crate) fn new(threshold: u64) -> Self {
        Self { threshold }
    }
}

impl ReleasePolicy for CountPolicy {
    fn should_release_inline(
        &self,
        pending_events: usize,
    ) -> bool {
        pending_events as u64 >= self.threshold
    }

    fn flush_interval(&self) -> Option<Duration> {
        None
    }
}
