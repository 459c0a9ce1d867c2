use std::time::Duration;

use super::ReleasePolicy;

/// Never releases inline; keys are flushed by the periodic release-all.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimePolicy {
    interval: Duration,
}

impl TimePolicy {
    pub(crate) fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl ReleasePolicy for TimePolicy {
    fn should_release_inline(
        &self,
        _pending_events: usize,
    ) -> bool {
        false
    }

    fn flush_interval(&self) -> Option<Duration> {
        Some(self.interval)
    }
}
