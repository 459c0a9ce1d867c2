//! Per-key aggregation on the consumer side of the ingestion ring.
//!
//! Each [`LedgerWorker`] owns the keys whose partition hash maps to its index and mutates
//! their [`KeyState`] from its own thread only. Everything a worker touches per event is
//! owned by that worker, so none of it is synchronized.

mod dispatcher;
mod key_state;
mod partition;
mod reclaimer;
pub(crate) mod release_policy;
mod stats;
mod worker;

pub(crate) use dispatcher::*;
pub(crate) use key_state::*;
pub(crate) use partition::*;
pub(crate) use reclaimer::*;
pub use stats::WorkerSnapshot;
pub(crate) use stats::WorkerStats;
pub(crate) use worker::*;
