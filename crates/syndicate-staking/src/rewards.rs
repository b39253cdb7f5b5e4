// crates/syndicate-staking/src/rewards.rs
//
// Fixed-point reward arithmetic for stake pools.
//
// Stake weight is `amount * multiplier`, where the multiplier is
// WEIGHT_MULTIPLIER (1e6) for an unlocked stake and grows linearly with the
// lock duration up to 2e6 at MAX_LOCK_SECONDS. Accumulated rewards per unit of
// weight are kept scaled by REWARD_PER_WEIGHT_MULTIPLIER (1e12). All
// intermediates are 256-bit and every division truncates.

use serde::{Deserialize, Serialize};
use syndicate_core::{Amount, SyndicateError, U256};

/// Multiplier of an unlocked stake.
pub const WEIGHT_MULTIPLIER: u128 = 1_000_000;

/// Multiplier of a stake locked for the full year, also used for yield stakes.
pub const YEAR_STAKE_WEIGHT_MULTIPLIER: u128 = 2 * WEIGHT_MULTIPLIER;

/// Scale of the reward-per-weight accumulator.
pub const REWARD_PER_WEIGHT_MULTIPLIER: u128 = 1_000_000_000_000;

/// Longest allowed lock: 365 days.
pub const MAX_LOCK_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Linear lock bonus curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockCurve {
    /// Longest lock a deposit may request, in seconds.
    pub max_lock_seconds: u64,
    /// Bonus added to the base multiplier at the maximum lock.
    pub max_bonus: u128,
}

impl Default for LockCurve {
    fn default() -> Self {
        Self {
            max_lock_seconds: MAX_LOCK_SECONDS,
            max_bonus: WEIGHT_MULTIPLIER,
        }
    }
}

impl LockCurve {
    /// Weight multiplier for a lock of `lock_seconds`.
    pub fn multiplier(&self, lock_seconds: u64) -> u128 {
        if self.max_lock_seconds == 0 {
            return WEIGHT_MULTIPLIER;
        }
        let lock = lock_seconds.min(self.max_lock_seconds) as u128;
        let bonus = U256::from(lock) * U256::from(self.max_bonus) / U256::from(self.max_lock_seconds);
        // lock <= max_lock, so bonus <= max_bonus
        WEIGHT_MULTIPLIER.saturating_add(bonus.low_u128())
    }

    /// Multiplier at the maximum lock.
    pub fn max_multiplier(&self) -> u128 {
        self.multiplier(self.max_lock_seconds)
    }

    /// Weight of `amount` locked for `lock_seconds`.
    ///
    /// # Errors
    /// Returns `SyndicateError::InvalidAmount` if the weight overflows 128 bits.
    pub fn weight(&self, amount: Amount, lock_seconds: u64) -> Result<u128, SyndicateError> {
        amount
            .checked_mul(self.multiplier(lock_seconds))
            .ok_or_else(|| SyndicateError::InvalidAmount(format!("weight of {} overflows", amount)))
    }
}

/// Convert a reward into the reward-per-weight increment it represents.
/// Returns zero when there is no weight to spread it over.
pub fn reward_to_weight(reward: U256, weight: u128) -> U256 {
    if weight == 0 {
        return U256::zero();
    }
    reward * U256::from(REWARD_PER_WEIGHT_MULTIPLIER) / U256::from(weight)
}

/// Reward owed to `weight` at accumulator value `reward_per_weight`.
pub fn weight_to_reward(weight: u128, reward_per_weight: U256) -> U256 {
    U256::from(weight) * reward_per_weight / U256::from(REWARD_PER_WEIGHT_MULTIPLIER)
}

/// Part of `emitted` owed to a pool of `pool_weight` out of `total_weight`.
pub fn pool_share(emitted: U256, pool_weight: u32, total_weight: u32) -> U256 {
    if total_weight == 0 {
        return U256::zero();
    }
    emitted * U256::from(pool_weight) / U256::from(total_weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndicate_core::units;

    #[test]
    fn test_unlocked_multiplier() {
        assert_eq!(LockCurve::default().multiplier(0), WEIGHT_MULTIPLIER);
    }

    #[test]
    fn test_full_year_multiplier() {
        let curve = LockCurve::default();
        assert_eq!(curve.max_multiplier(), YEAR_STAKE_WEIGHT_MULTIPLIER);
        assert_eq!(curve.multiplier(MAX_LOCK_SECONDS * 3), YEAR_STAKE_WEIGHT_MULTIPLIER);
    }

    #[test]
    fn test_one_second_short_of_a_year() {
        assert_eq!(LockCurve::default().multiplier(MAX_LOCK_SECONDS - 1), 1_999_999);
    }

    #[test]
    fn test_weight_of_locked_stake() {
        let weight = LockCurve::default().weight(units(1_000), MAX_LOCK_SECONDS - 1).unwrap();
        assert_eq!(weight, 1_999_999_000_000_000_000_000_000_000);
    }

    #[test]
    fn test_weight_overflow() {
        assert!(LockCurve::default().weight(u128::MAX, 0).is_err());
    }

    #[test]
    fn test_reward_to_weight_truncates() {
        let weight = 1_999_999_000_000_000_000_000_000_000u128;
        let increment = reward_to_weight(U256::from(units(990)), weight);
        assert_eq!(increment, U256::from(495_000u64));
        assert_eq!(reward_to_weight(U256::from(5u64), 0), U256::zero());
    }

    #[test]
    fn test_weight_to_reward() {
        let weight = 2 * 1_999_999_000_000_000_000_000_000_000u128;
        let reward = weight_to_reward(weight, U256::from(495_000u64));
        assert_eq!(reward, U256::from(1_979_999_010_000_000_000_000u128));
    }

    #[test]
    fn test_pool_share() {
        assert_eq!(pool_share(U256::from(1_000u64), 200, 1_000), U256::from(200u64));
        assert_eq!(pool_share(U256::from(1_000u64), 1, 0), U256::zero());
    }
}
