use std::sync::Arc;
use std::time::Instant;

use crate::errors::BalanceOverflow;
use crate::EventKind;
use crate::LedgerEvent;
use crate::ReleaseResult;

/// Aggregation state of one key, mutated only by the worker owning the key.
///
/// At every point `current_balance() == committed_balance() + pending_delta()` and
/// `pending_delta()` is the signed sum of the pending log. The committed balance only moves
/// at initialization and at release.
#[derive(Debug)]
pub(crate) struct KeyState {
    key: Arc<str>,
    /// Sequence of the last applied event, 0 before the first one
    sequence: u64,
    pending_delta: i64,
    pending: Vec<PendingEntry>,
    initialized: bool,
    committed_balance: i64,
    last_committed_sequence: u64,
}

/// Pending log entry; the key is attached when the entry becomes a [`LedgerEvent`].
#[derive(Debug, Clone, Copy)]
struct PendingEntry {
    sequence: u64,
    kind: EventKind,
    amount: u64,
    timestamp_ms: u64,
    balance_after: i64,
}

impl KeyState {
    pub(crate) fn new(key: Arc<str>) -> Self {
        Self {
            key,
            sequence: 0,
            pending_delta: 0,
            pending: Vec::new(),
            initialized: false,
            committed_balance: 0,
            last_committed_sequence: 0,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Sets the starting balance of this session.
    pub(crate) fn initialize(
        &mut self,
        balance: i64,
    ) {
        debug_assert!(!self.initialized, "key {} initialized twice", self.key);
        self.committed_balance = balance;
        self.initialized = true;
    }

    /// Applies a credit or debit and returns the per-key sequence it was given.
    ///
    /// An event that would push the pending delta or the balance outside `i64` is rejected
    /// and leaves the state untouched. Release never overflows afterwards, since the
    /// committed balance moves to a balance that was already in range.
    pub(crate) fn apply(
        &mut self,
        kind: EventKind,
        amount: u64,
        timestamp_ms: u64,
    ) -> Result<u64, BalanceOverflow> {
        debug_assert!(self.initialized);
        debug_assert!(kind.is_ledger());

        let overflow = || BalanceOverflow {
            key: self.key.to_string(),
            kind,
            amount,
            pending_delta: self.pending_delta,
            balance: self.current_balance(),
        };
        let signed = i64::try_from(amount).map_err(|_| overflow())?;
        let signed = if kind == EventKind::Debit { -signed } else { signed };
        let pending_delta = self.pending_delta.checked_add(signed).ok_or_else(overflow)?;
        let balance_after = self
            .committed_balance
            .checked_add(pending_delta)
            .ok_or_else(overflow)?;

        self.pending_delta = pending_delta;
        self.sequence += 1;
        self.pending.push(PendingEntry {
            sequence: self.sequence,
            kind,
            amount,
            timestamp_ms,
            balance_after,
        });
        Ok(self.sequence)
    }

    /// Drains the pending log and commits its delta.
    ///
    /// Returns `None` without touching anything when nothing is pending.
    pub(crate) fn release(&mut self) -> Option<ReleaseResult> {
        if self.pending.is_empty() {
            return None;
        }

        let started = Instant::now();
        let delta = self.pending_delta;
        let count = self.pending.len() as u64;
        let key = &self.key;
        let events: Arc<[LedgerEvent]> = self
            .pending
            .drain(..)
            .map(|entry| {
                LedgerEvent::from_parts(
                    Arc::clone(key),
                    entry.sequence,
                    entry.kind,
                    entry.amount,
                    entry.timestamp_ms,
                    entry.balance_after,
                )
            })
            .collect();
        self.pending_delta = 0;
        self.last_committed_sequence += count;
        self.committed_balance += delta;
        let duration = started.elapsed();

        Some(ReleaseResult::new(
            Arc::clone(&self.key),
            delta,
            duration,
            events,
            self.committed_balance,
        ))
    }

    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn pending_delta(&self) -> i64 {
        self.pending_delta
    }

    pub(crate) fn committed_balance(&self) -> i64 {
        self.committed_balance
    }

    pub(crate) fn current_balance(&self) -> i64 {
        self.committed_balance + self.pending_delta
    }

    pub(crate) fn last_committed_sequence(&self) -> u64 {
        self.last_committed_sequence
    }
}
