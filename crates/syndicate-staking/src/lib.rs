// crates/syndicate-staking/src/lib.rs
//
// syndicate-staking: emission schedule, time-weighted stake pools, the pool
// factory, the escrow swap, and the in-memory ledger that executes them as
// ordered atomic transactions.

pub mod emission;
pub mod factory;
pub mod ledger;
pub mod pool;
pub mod rewards;
pub mod swap;

// Re-export key types for ergonomic access from downstream crates.
pub use emission::{EmissionSchedule, DEFAULT_DECAY_DENOMINATOR, DEFAULT_DECAY_NUMERATOR};
pub use factory::{PoolData, PoolFactory};
pub use ledger::{DeployParams, Ledger};
pub use pool::{RewardSource, Stake, StakePool, StakeStatus, StakerAccount, Withdrawal};
pub use rewards::{
    reward_to_weight, weight_to_reward, LockCurve, MAX_LOCK_SECONDS, REWARD_PER_WEIGHT_MULTIPLIER,
    WEIGHT_MULTIPLIER, YEAR_STAKE_WEIGHT_MULTIPLIER,
};
pub use swap::SwapEscrow;
