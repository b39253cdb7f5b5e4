// crates/syndicate-staking/src/emission.rs
//
// Block reward emission schedule with periodic multiplicative decay.
//
// The reward per block starts at `reward_per_block_initial` and is multiplied
// by `decay_numerator / decay_denominator` (97/100 by default, a 3% cut)
// every `blocks_per_update` blocks, truncating at each step. No reward is
// emitted before `start_block` or at/after `end_block`.
//
// Nothing here is cached: the reward for any block is recomputed from the
// schedule parameters, so reading it once or stepping it period by period
// gives the same number.

use serde::{Deserialize, Serialize};
use syndicate_core::{Amount, SyndicateError, U256};

/// Default decay: keep 97% of the reward at each update.
pub const DEFAULT_DECAY_NUMERATOR: u128 = 97;
pub const DEFAULT_DECAY_DENOMINATOR: u128 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    pub reward_per_block_initial: Amount,
    pub blocks_per_update: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub decay_numerator: u128,
    pub decay_denominator: u128,
}

impl EmissionSchedule {
    /// Schedule with the default 3% decay per update.
    ///
    /// # Errors
    /// Returns `SyndicateError::InvalidArgument` if `blocks_per_update` is zero
    /// or `end_block` does not come after `start_block`.
    pub fn new(
        reward_per_block_initial: Amount,
        blocks_per_update: u64,
        start_block: u64,
        end_block: u64,
    ) -> Result<Self, SyndicateError> {
        if blocks_per_update == 0 {
            return Err(SyndicateError::InvalidArgument(
                "blocks per update must be positive".to_string(),
            ));
        }
        if end_block <= start_block {
            return Err(SyndicateError::InvalidArgument(format!(
                "end block {} must be after start block {}",
                end_block, start_block
            )));
        }
        Ok(Self {
            reward_per_block_initial,
            blocks_per_update,
            start_block,
            end_block,
            decay_numerator: DEFAULT_DECAY_NUMERATOR,
            decay_denominator: DEFAULT_DECAY_DENOMINATOR,
        })
    }

    /// Replace the decay factor. The factor must not exceed one.
    pub fn with_decay(mut self, numerator: u128, denominator: u128) -> Result<Self, SyndicateError> {
        if denominator == 0 || numerator > denominator {
            return Err(SyndicateError::InvalidArgument(format!(
                "decay factor {}/{} must be within [0, 1]",
                numerator, denominator
            )));
        }
        self.decay_numerator = numerator;
        self.decay_denominator = denominator;
        Ok(self)
    }

    /// Index of the update period containing `block` (0 before the start).
    pub fn period_at(&self, block: u64) -> u64 {
        block.saturating_sub(self.start_block) / self.blocks_per_update
    }

    /// First block of update period `period`.
    pub fn period_start(&self, period: u64) -> u64 {
        self.start_block
            .saturating_add(period.saturating_mul(self.blocks_per_update))
    }

    /// Apply one decay step to `reward`, truncating.
    pub fn decay(&self, reward: Amount) -> Amount {
        let decayed = U256::from(reward) * U256::from(self.decay_numerator)
            / U256::from(self.decay_denominator);
        // numerator <= denominator, so the result never exceeds `reward`
        decayed.low_u128()
    }

    /// True when the factor is exactly one and the reward never decays.
    pub fn is_flat(&self) -> bool {
        self.decay_numerator == self.decay_denominator
    }

    /// Reward per block during update period `period`.
    pub fn reward_for_period(&self, period: u64) -> Amount {
        if self.is_flat() {
            return self.reward_per_block_initial;
        }
        let mut reward = self.reward_per_block_initial;
        for _ in 0..period {
            if reward == 0 {
                break;
            }
            reward = self.decay(reward);
        }
        reward
    }

    /// Reward emitted for `block`.
    pub fn reward_per_block_at(&self, block: u64) -> Amount {
        if block < self.start_block || block >= self.end_block {
            return 0;
        }
        self.reward_for_period(self.period_at(block))
    }

    /// Total reward emitted for blocks in `[from, to)`.
    ///
    /// Walks segment by segment across decay boundaries, stepping the reward
    /// once per boundary; the result equals summing `reward_per_block_at`
    /// block by block.
    pub fn emitted_between(&self, from: u64, to: u64) -> U256 {
        let from = from.max(self.start_block);
        let to = to.min(self.end_block);
        if from >= to {
            return U256::zero();
        }
        if self.is_flat() {
            return U256::from(self.reward_per_block_initial) * U256::from(to - from);
        }

        let mut total = U256::zero();
        let mut period = self.period_at(from);
        let mut reward = self.reward_for_period(period);
        let mut current_block = from;

        while current_block < to && reward > 0 {
            let next_update_block = self.period_start(period + 1);
            let segment_end = to.min(next_update_block);
            let blocks_in_segment = segment_end - current_block;
            total += U256::from(reward) * U256::from(blocks_in_segment);

            current_block = segment_end;
            period += 1;
            reward = self.decay(reward);
        }

        total
    }

    /// Total reward the schedule ever emits.
    pub fn total_emission(&self) -> U256 {
        self.emitted_between(self.start_block, self.end_block)
    }

    /// `(period, first block, reward per block)` for the first `count` periods
    /// that start before the end block.
    pub fn periods(&self, count: u64) -> Vec<(u64, u64, Amount)> {
        let mut rows = Vec::new();
        let mut reward = self.reward_per_block_initial;
        for period in 0..count {
            let first_block = self.period_start(period);
            if first_block >= self.end_block {
                break;
            }
            rows.push((period, first_block, reward));
            reward = self.decay(reward);
        }
        rows
    }
}
