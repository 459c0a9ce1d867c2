use std::sync::Arc;
use std::time::Duration;

use super::LedgerEvent;

/// Outcome of draining one key's pending events.
///
/// Cloning is cheap: the key and event list are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseResult {
    key: Arc<str>,
    event_count: u64,
    delta: i64,
    duration: Duration,
    events: Arc<[LedgerEvent]>,
    running_balance: i64,
}

impl ReleaseResult {
    pub(crate) fn new(
        key: Arc<str>,
        delta: i64,
        duration: Duration,
        events: Arc<[LedgerEvent]>,
        running_balance: i64,
    ) -> Self {
        Self {
            key,
            event_count: events.len() as u64,
            delta,
            duration,
            events,
            running_balance,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Net signed sum of the released events.
    pub fn delta(&self) -> i64 {
        self.delta
    }

    /// Time spent draining the pending log and committing the delta.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Released events in strictly increasing per-key sequence order.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Shared handle to the event list, for sinks that keep it beyond the callback.
    pub fn shared_events(&self) -> Arc<[LedgerEvent]> {
        Arc::clone(&self.events)
    }

    /// Committed balance of the key after this release.
    pub fn running_balance(&self) -> i64 {
        self.running_balance
    }
}
