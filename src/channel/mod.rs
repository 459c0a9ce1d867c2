//! Ingestion channel.
//!
//! A bounded multi-producer ring of pre-allocated [`EventSlot`]s. Producers claim a global
//! sequence, wait for the slot's previous occupant to be reclaimed, write it and flag it
//! published. Every worker reads every sequence in order through its own cursor; the slot
//! reclaimer trails the slowest worker and is the cursor producers are gated on.

mod publisher;
mod ring_buffer;
mod sequence;
mod slot;
mod wait_strategy;

pub(crate) use publisher::*;
pub(crate) use ring_buffer::*;
pub(crate) use sequence::*;
pub(crate) use slot::*;
pub(crate) use wait_strategy::*;


use crate::Error;

/// The channel stopped accepting or delivering events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ingestion channel halted")]
pub(crate) struct Halted;

impl From<Halted> for Error {
    fn from(_: Halted) -> Self {
        Error::EngineShutdown
    }
}
