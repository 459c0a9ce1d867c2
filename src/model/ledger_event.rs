use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::utils::time::system_time_from_millis;
use crate::Error;
use crate::Result;

/// Operation carried by a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Credit,
    Debit,
    /// Release one key and answer the caller waiting on it
    Release,
    /// Release every key with pending data
    ReleaseAll,
}

impl EventKind {
    /// Whether this kind mutates a balance.
    pub fn is_ledger(self) -> bool {
        matches!(self, EventKind::Credit | EventKind::Debit)
    }

    /// Signed contribution of `amount` to a balance; zero for control kinds.
    ///
    /// `amount` is expected to fit in `i64`, which the publishing side enforces.
    pub fn signed(
        self,
        amount: u64,
    ) -> i64 {
        match self {
            EventKind::Credit => amount as i64,
            EventKind::Debit => -(amount as i64),
            EventKind::Release | EventKind::ReleaseAll => 0,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            EventKind::Credit => "CREDIT",
            EventKind::Debit => "DEBIT",
            EventKind::Release => "RELEASE",
            EventKind::ReleaseAll => "RELEASE_ALL",
        };
        f.write_str(name)
    }
}

/// One applied credit or debit, materialized when its key is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    key: Arc<str>,
    sequence: u64,
    kind: EventKind,
    amount: u64,
    timestamp_ms: u64,
    balance_after: i64,
}

impl LedgerEvent {
    /// Builds a validated event.
    ///
    /// Rejects empty keys, a zero sequence (per-key sequences start at 1), control kinds and
    /// amounts that do not fit a signed balance.
    pub fn new(
        key: impl Into<Arc<str>>,
        sequence: u64,
        kind: EventKind,
        amount: u64,
        timestamp_ms: u64,
        balance_after: i64,
    ) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidLedgerEvent("key must not be empty".into()));
        }
        if sequence == 0 {
            return Err(Error::InvalidLedgerEvent(format!(
                "sequence must be positive for key {}",
                key
            )));
        }
        if !kind.is_ledger() {
            return Err(Error::InvalidLedgerEvent(format!(
                "{} is not a ledger operation",
                kind
            )));
        }
        if amount > i64::MAX as u64 {
            return Err(Error::InvalidLedgerEvent(format!(
                "amount {} overflows a signed balance",
                amount
            )));
        }
        Ok(Self::from_parts(key, sequence, kind, amount, timestamp_ms, balance_after))
    }

    pub(crate) fn from_parts(
        key: Arc<str>,
        sequence: u64,
        kind: EventKind,
        amount: u64,
        timestamp_ms: u64,
        balance_after: i64,
    ) -> Self {
        Self {
            key,
            sequence,
            kind,
            amount,
            timestamp_ms,
            balance_after,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Per-key sequence, starting at 1 for the first event ever applied to the key.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Amount with the sign implied by the kind.
    pub fn signed_amount(&self) -> i64 {
        self.kind.signed(self.amount)
    }

    /// Publish time in milliseconds since the unix epoch.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn timestamp(&self) -> SystemTime {
        system_time_from_millis(self.timestamp_ms)
    }

    /// Balance of the key right after this event was applied.
    pub fn balance_after(&self) -> i64 {
        self.balance_after
    }
}
