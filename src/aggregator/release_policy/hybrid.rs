//! Hybrid release policy.
//! Combines the count threshold with the periodic flush; whichever fires first releases.

use std::time::Duration;

use super::CountPolicy;
use super::ReleasePolicy;
use super::TimePolicy;

#[derive(Debug, Clone, Copy)]
pub(crate) struct HybridPolicy {
    count_policy: CountPolicy,
    time_policy: TimePolicy,
}

impl HybridPolicy {
    pub(crate) fn new(
        threshold: u64,
        interval: Duration,
    ) -> Self {
        Self {
            count_policy: CountPolicy::new(threshold),
            time_policy: TimePolicy::new(interval),
        }
    }
}

impl ReleasePolicy for HybridPolicy {
    fn should_release_inline(
        &self,
        pending_events: usize,
    ) -> bool {
        self.count_policy.should_release_inline(pending_events)
            || self.time_policy.should_release_inline(pending_events)
    }

    fn flush_interval(&self) -> Option<Duration> {
        self.time_policy.flush_interval()
    }
}
