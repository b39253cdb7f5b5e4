// crates/syndicate-core/src/block.rs

use serde::{Deserialize, Serialize};

/// Block context supplied by the ledger substrate to every operation.
///
/// Reward math reads only these two values, never the wall clock, so a
/// replay of the same transaction log produces the same state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEnv {
    /// Height of the block the operation executes in.
    pub number: u64,
    /// Block timestamp in seconds.
    pub timestamp: u64,
}

impl BlockEnv {
    pub fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }

    /// The next block, one second later. Both values stop at `u64::MAX`.
    pub fn next(&self) -> Self {
        Self {
            number: self.number.saturating_add(1),
            timestamp: self.timestamp.saturating_add(1),
        }
    }
}
