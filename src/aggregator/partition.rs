use std::hash::Hash;
use std::hash::Hasher;

use rustc_hash::FxHasher;

/// Partition hash of a key; identical on every thread and for the engine lifetime.
pub(crate) fn partition_hash(key: &str) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

/// The slice of the key space one worker owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Partition {
    index: usize,
    count: usize,
}

impl Partition {
    pub(crate) fn new(
        index: usize,
        count: usize,
    ) -> Self {
        debug_assert!(index < count);
        Self { index, count }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Worker index owning `key_hash` among `count` workers.
    pub(crate) fn owner_of(
        key_hash: u64,
        count: usize,
    ) -> usize {
        (key_hash % count as u64) as usize
    }

    pub(crate) fn owns(
        &self,
        key_hash: u64,
    ) -> bool {
        Self::owner_of(key_hash, self.count) == self.index
    }
}
