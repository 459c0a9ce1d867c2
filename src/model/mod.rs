//! Immutable records handed to callers when a key is released.

mod ledger_event;
mod release_result;

pub use ledger_event::*;
pub use release_result::*;
