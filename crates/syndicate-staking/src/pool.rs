// crates/syndicate-staking/src/pool.rs
//
// Time-weighted stake pool.
//
// Every deposit becomes a `Stake` whose weight is its amount times the lock
// multiplier. The pool keeps a reward-per-weight accumulator that `sync`
// advances by the pool's share of the emission since the last distribution,
// spread over the total locked weight. A staker's pending reward is
//
//   weight_to_reward(total_weight, accumulator) - sub_yield_rewards + unclaimed
//
// where `sub_yield_rewards` is the checkpoint taken at the staker's last
// weight change. Before any weight change the pending amount is moved into
// `unclaimed`, so weight changes never create or destroy rewards.
//
// Token movement is not done here: the ledger moves principal and mints
// rewards around these bookkeeping calls.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use syndicate_core::{to_amount, AccountId, Amount, BlockEnv, SyndicateError, U256};

use crate::emission::EmissionSchedule;
use crate::rewards::{pool_share, reward_to_weight, weight_to_reward, LockCurve};

/// Lifecycle of a single stake.
///
/// Valid transitions:
///   Active -> PartiallyWithdrawn -> Closed
///   Active -> Closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeStatus {
    Active,
    PartiallyWithdrawn,
    /// Fully withdrawn. The slot stays in place so later indices keep their meaning.
    Closed,
}

impl fmt::Display for StakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakeStatus::Active => write!(f, "Active"),
            StakeStatus::PartiallyWithdrawn => write!(f, "PartiallyWithdrawn"),
            StakeStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl StakeStatus {
    /// Status after a withdrawal leaving `remaining` staked.
    pub fn after_withdrawal(self, remaining: Amount) -> Result<StakeStatus, SyndicateError> {
        let next = match self {
            StakeStatus::Closed => {
                return Err(SyndicateError::InvalidState(
                    "cannot withdraw from a closed stake".to_string(),
                ))
            }
            _ if remaining == 0 => StakeStatus::Closed,
            _ => StakeStatus::PartiallyWithdrawn,
        };
        if next != self {
            tracing::debug!("Stake transition: {} -> {}", self, next);
        }
        Ok(next)
    }
}

/// One deposit in a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub amount: Amount,
    pub weight: u128,
    /// Timestamp the lock started, 0 for an unlocked deposit.
    pub locked_from: u64,
    /// Timestamp the lock ends, 0 for an unlocked deposit.
    pub locked_until: u64,
    /// Block the deposit was made in.
    pub deposit_block: u64,
    /// Compounded reward rather than deposited principal.
    pub is_yield: bool,
    pub status: StakeStatus,
}

impl Stake {
    /// A stake is locked while its lock end is still in the future.
    pub fn is_locked(&self, now: u64) -> bool {
        self.locked_until > now
    }

    pub fn lock_seconds(&self) -> u64 {
        self.locked_until.saturating_sub(self.locked_from)
    }
}

/// Per-account position in a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerAccount {
    pub token_amount: Amount,
    pub total_weight: u128,
    /// Reward checkpoint taken at the last weight change.
    pub sub_yield_rewards: U256,
    /// Rewards accrued but not yet paid out.
    pub unclaimed: Amount,
    pub stakes: Vec<Stake>,
}

impl StakerAccount {
    /// Move everything owed at `reward_per_weight` into `unclaimed` and
    /// reset the checkpoint.
    fn accrue(&mut self, reward_per_weight: U256) -> Result<(), SyndicateError> {
        let owed = weight_to_reward(self.total_weight, reward_per_weight);
        let pending = to_amount(owed.saturating_sub(self.sub_yield_rewards))?;
        self.unclaimed = self
            .unclaimed
            .checked_add(pending)
            .ok_or_else(|| SyndicateError::InvalidAmount("unclaimed rewards overflow".to_string()))?;
        self.sub_yield_rewards = owed;
        Ok(())
    }
}

/// Emission parameters a pool reads from its factory during sync.
#[derive(Debug, Clone, Copy)]
pub struct RewardSource<'a> {
    pub schedule: &'a EmissionSchedule,
    pub total_weight: u32,
}

/// Principal released by a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub amount: Amount,
    /// Yield principal has no backing in the pool and must be minted.
    pub is_yield: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePool {
    address: AccountId,
    pool_token: AccountId,
    is_core: bool,
    weight: u32,
    created_block: u64,
    last_yield_distribution: u64,
    yield_rewards_per_weight: U256,
    users_locking_weight: u128,
    pool_token_reserve: Amount,
    lock_curve: LockCurve,
    stakers: BTreeMap<AccountId, StakerAccount>,
}

impl StakePool {
    pub fn new(
        address: AccountId,
        pool_token: AccountId,
        is_core: bool,
        weight: u32,
        init_block: u64,
        lock_curve: LockCurve,
    ) -> Self {
        Self {
            address,
            pool_token,
            is_core,
            weight,
            created_block: init_block,
            last_yield_distribution: init_block,
            yield_rewards_per_weight: U256::zero(),
            users_locking_weight: 0,
            pool_token_reserve: 0,
            lock_curve,
            stakers: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn pool_token(&self) -> &AccountId {
        &self.pool_token
    }

    pub fn is_core(&self) -> bool {
        self.is_core
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub(crate) fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
    }

    pub fn created_block(&self) -> u64 {
        self.created_block
    }

    pub fn last_yield_distribution(&self) -> u64 {
        self.last_yield_distribution
    }

    pub fn yield_rewards_per_weight(&self) -> U256 {
        self.yield_rewards_per_weight
    }

    pub fn users_locking_weight(&self) -> u128 {
        self.users_locking_weight
    }

    /// Total principal, deposited and compounded, held by the pool.
    pub fn pool_token_reserve(&self) -> Amount {
        self.pool_token_reserve
    }

    pub fn lock_curve(&self) -> &LockCurve {
        &self.lock_curve
    }

    pub fn staker(&self, account: &AccountId) -> Option<&StakerAccount> {
        self.stakers.get(account)
    }

    pub fn stakers(&self) -> impl Iterator<Item = (&AccountId, &StakerAccount)> {
        self.stakers.iter()
    }

    /// Principal `account` has in the pool.
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.stakers.get(account).map(|s| s.token_amount).unwrap_or(0)
    }

    pub fn stakes_of(&self, account: &AccountId) -> &[Stake] {
        self.stakers
            .get(account)
            .map(|s| s.stakes.as_slice())
            .unwrap_or(&[])
    }

    pub fn stake(&self, account: &AccountId, index: usize) -> Option<&Stake> {
        self.stakes_of(account).get(index)
    }

    /// Accumulator value as of `block`, without mutating the pool.
    fn reward_per_weight_at(&self, block: u64, source: RewardSource<'_>) -> U256 {
        let end = source.schedule.end_block;
        if self.last_yield_distribution >= end
            || block <= self.last_yield_distribution
            || self.users_locking_weight == 0
        {
            return self.yield_rewards_per_weight;
        }
        let current = block.min(end);
        let emitted = source
            .schedule
            .emitted_between(self.last_yield_distribution, current);
        let reward = pool_share(emitted, self.weight, source.total_weight);
        self.yield_rewards_per_weight + reward_to_weight(reward, self.users_locking_weight)
    }

    /// Bring the accumulator up to the current block.
    ///
    /// A no-op after the schedule ends or when already synced in this block.
    /// With no locked weight the distribution point moves forward and the
    /// emission for those blocks goes to nobody.
    pub fn sync(&mut self, env: &BlockEnv, source: RewardSource<'_>) {
        let end = source.schedule.end_block;
        if self.last_yield_distribution >= end || env.number <= self.last_yield_distribution {
            return;
        }
        let current = env.number.min(end);
        self.yield_rewards_per_weight = self.reward_per_weight_at(current, source);
        tracing::debug!(
            "Synced pool {} to block {}: reward per weight {}",
            self.address.short(),
            current,
            self.yield_rewards_per_weight
        );
        self.last_yield_distribution = current;
    }

    /// Rewards `account` could claim at `env`, as if the pool were synced.
    pub fn pending_yield_rewards(
        &self,
        account: &AccountId,
        env: &BlockEnv,
        source: RewardSource<'_>,
    ) -> Result<Amount, SyndicateError> {
        let staker = match self.stakers.get(account) {
            Some(staker) => staker,
            None => return Ok(0),
        };
        let reward_per_weight = self.reward_per_weight_at(env.number, source);
        let owed = weight_to_reward(staker.total_weight, reward_per_weight);
        let pending = to_amount(owed.saturating_sub(staker.sub_yield_rewards))?;
        pending
            .checked_add(staker.unclaimed)
            .ok_or_else(|| SyndicateError::InvalidAmount("pending rewards overflow".to_string()))
    }

    /// Take everything `account` is owed at the current accumulator.
    /// Call `sync` first.
    pub fn claim(&mut self, account: &AccountId) -> Result<Amount, SyndicateError> {
        let reward_per_weight = self.yield_rewards_per_weight;
        match self.stakers.get_mut(account) {
            Some(staker) => {
                staker.accrue(reward_per_weight)?;
                Ok(std::mem::take(&mut staker.unclaimed))
            }
            None => Ok(0),
        }
    }

    /// Check a lock end against the current time and the lock curve.
    pub fn validate_lock(&self, lock_until: u64, env: &BlockEnv) -> Result<(), SyndicateError> {
        if lock_until == 0 {
            return Ok(());
        }
        if lock_until <= env.timestamp {
            return Err(SyndicateError::InvalidArgument(format!(
                "lock end {} is not in the future (now {})",
                lock_until, env.timestamp
            )));
        }
        if lock_until - env.timestamp > self.lock_curve.max_lock_seconds {
            return Err(SyndicateError::InvalidArgument(format!(
                "lock of {}s exceeds the maximum of {}s",
                lock_until - env.timestamp,
                self.lock_curve.max_lock_seconds
            )));
        }
        Ok(())
    }

    /// Record a principal deposit. Returns the new stake's index.
    /// Call `sync` first.
    pub fn deposit(
        &mut self,
        account: &AccountId,
        amount: Amount,
        lock_until: u64,
        env: &BlockEnv,
    ) -> Result<usize, SyndicateError> {
        self.validate_lock(lock_until, env)?;
        let locked_from = if lock_until > 0 { env.timestamp } else { 0 };
        self.push_stake(account, amount, locked_from, lock_until, false, env)
    }

    /// Record compounded rewards as a yield stake locked for the maximum
    /// duration. Call `sync` first.
    pub fn deposit_yield(
        &mut self,
        account: &AccountId,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<usize, SyndicateError> {
        let locked_until = env.timestamp.saturating_add(self.lock_curve.max_lock_seconds);
        self.push_stake(account, amount, env.timestamp, locked_until, true, env)
    }

    fn push_stake(
        &mut self,
        account: &AccountId,
        amount: Amount,
        locked_from: u64,
        locked_until: u64,
        is_yield: bool,
        env: &BlockEnv,
    ) -> Result<usize, SyndicateError> {
        if amount == 0 {
            return Err(SyndicateError::InvalidAmount("stake amount must be positive".to_string()));
        }
        let weight = self.lock_curve.weight(amount, locked_until.saturating_sub(locked_from))?;
        let overflow = || SyndicateError::InvalidAmount("pool totals overflow".to_string());
        let locking_weight = self.users_locking_weight.checked_add(weight).ok_or_else(overflow)?;
        let reserve = self.pool_token_reserve.checked_add(amount).ok_or_else(overflow)?;

        let reward_per_weight = self.yield_rewards_per_weight;
        let staker = self.stakers.entry(*account).or_default();
        staker.accrue(reward_per_weight)?;
        let token_amount = staker.token_amount.checked_add(amount).ok_or_else(overflow)?;
        let total_weight = staker.total_weight.checked_add(weight).ok_or_else(overflow)?;

        staker.token_amount = token_amount;
        staker.total_weight = total_weight;
        staker.stakes.push(Stake {
            amount,
            weight,
            locked_from,
            locked_until,
            deposit_block: env.number,
            is_yield,
            status: StakeStatus::Active,
        });
        staker.sub_yield_rewards = weight_to_reward(total_weight, reward_per_weight);
        let index = staker.stakes.len() - 1;

        self.users_locking_weight = locking_weight;
        self.pool_token_reserve = reserve;

        tracing::info!(
            "Stake {} opened in pool {} by {}: amount={}, weight={}, yield={}",
            index,
            self.address.short(),
            account.short(),
            amount,
            weight,
            is_yield
        );
        Ok(index)
    }

    /// Validate a withdrawal without changing anything.
    pub fn check_withdrawal(
        &self,
        account: &AccountId,
        index: usize,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<&Stake, SyndicateError> {
        if amount == 0 {
            return Err(SyndicateError::InvalidAmount("unstake amount must be positive".to_string()));
        }
        let stake = self
            .stake(account, index)
            .filter(|s| s.status != StakeStatus::Closed)
            .ok_or_else(|| {
                SyndicateError::NotFound(format!(
                    "no open stake {} for {} in pool {}",
                    index,
                    account.short(),
                    self.address.short()
                ))
            })?;
        if amount > stake.amount {
            return Err(SyndicateError::InsufficientBalance {
                requested: amount,
                available: stake.amount,
            });
        }
        if stake.is_locked(env.timestamp) {
            return Err(SyndicateError::StakeLocked {
                locked_until: stake.locked_until,
                now: env.timestamp,
            });
        }
        Ok(stake)
    }

    /// Reduce stake `index` by `amount`, carrying pending rewards into
    /// `unclaimed`. Call `sync` first.
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        index: usize,
        amount: Amount,
        env: &BlockEnv,
    ) -> Result<Withdrawal, SyndicateError> {
        self.check_withdrawal(account, index, amount, env)?;

        let reward_per_weight = self.yield_rewards_per_weight;
        let curve = self.lock_curve;
        let staker = self
            .stakers
            .get_mut(account)
            .ok_or_else(|| SyndicateError::NotFound(format!("no staker {}", account.short())))?;
        staker.accrue(reward_per_weight)?;

        let stake = staker
            .stakes
            .get_mut(index)
            .ok_or_else(|| SyndicateError::NotFound(format!("no stake {}", index)))?;
        let remaining = stake.amount - amount;
        let previous_weight = stake.weight;
        let new_weight = curve.weight(remaining, stake.lock_seconds())?;
        stake.status = stake.status.after_withdrawal(remaining)?;
        stake.amount = remaining;
        stake.weight = new_weight;
        let is_yield = stake.is_yield;

        // new_weight <= previous_weight, and every stake weight is part of both totals
        staker.token_amount -= amount;
        staker.total_weight = staker.total_weight - previous_weight + new_weight;
        staker.sub_yield_rewards = weight_to_reward(staker.total_weight, reward_per_weight);
        self.users_locking_weight = self.users_locking_weight - previous_weight + new_weight;
        self.pool_token_reserve -= amount;

        tracing::info!(
            "Stake {} in pool {} reduced by {} for {}: remaining={}",
            index,
            self.address.short(),
            amount,
            account.short(),
            remaining
        );
        Ok(Withdrawal { amount, is_yield })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::{MAX_LOCK_SECONDS, YEAR_STAKE_WEIGHT_MULTIPLIER};
    use syndicate_core::units;

    fn schedule() -> EmissionSchedule {
        EmissionSchedule::new(units(990), 91_252, 10, 10 + 7_120_725).unwrap()
    }

    fn source(schedule: &EmissionSchedule) -> RewardSource<'_> {
        RewardSource {
            schedule,
            total_weight: 200,
        }
    }

    fn new_pool() -> StakePool {
        StakePool::new(
            AccountId::from_label("pool"),
            AccountId::from_label("SYN"),
            true,
            200,
            10,
            LockCurve::default(),
        )
    }

    fn alice() -> AccountId {
        AccountId::from_label("alice")
    }

    fn sync_and_deposit(pool: &mut StakePool, env: &BlockEnv, lock_until: u64) -> usize {
        let schedule = schedule();
        pool.sync(env, source(&schedule));
        pool.deposit(&alice(), units(1_000), lock_until, env).unwrap()
    }

    #[test]
    fn test_sync_without_weight_moves_distribution_point() {
        let schedule = schedule();
        let mut pool = new_pool();
        pool.sync(&BlockEnv::new(15, 100), source(&schedule));
        assert_eq!(pool.last_yield_distribution(), 15);
        assert_eq!(pool.yield_rewards_per_weight(), U256::zero());
    }

    #[test]
    fn test_first_stake_has_nothing_pending() {
        let schedule = schedule();
        let mut pool = new_pool();
        let env = BlockEnv::new(11, 1_000);
        sync_and_deposit(&mut pool, &env, 1_000 + MAX_LOCK_SECONDS - 1);
        assert_eq!(pool.pending_yield_rewards(&alice(), &env, source(&schedule)).unwrap(), 0);
    }

    #[test]
    fn test_one_block_of_rewards() {
        let schedule = schedule();
        let mut pool = new_pool();
        let env = BlockEnv::new(11, 1_000);
        sync_and_deposit(&mut pool, &env, 1_000 + MAX_LOCK_SECONDS - 1);
        let pending = pool
            .pending_yield_rewards(&alice(), &env.next(), source(&schedule))
            .unwrap();
        assert_eq!(pending, 989_999_505_000_000_000_000);
    }

    #[test]
    fn test_second_stake_carries_pending() {
        let schedule = schedule();
        let mut pool = new_pool();
        let env = BlockEnv::new(11, 1_000);
        sync_and_deposit(&mut pool, &env, 1_000 + MAX_LOCK_SECONDS - 1);

        let env = env.next();
        sync_and_deposit(&mut pool, &env, 1_000 + MAX_LOCK_SECONDS - 1);
        assert_eq!(pool.staker(&alice()).unwrap().unclaimed, 989_999_505_000_000_000_000);

        let pending = pool
            .pending_yield_rewards(&alice(), &env.next(), source(&schedule))
            .unwrap();
        assert_eq!(pending, 2 * 989_999_505_000_000_000_000);
        assert_eq!(pool.claim(&alice()).unwrap(), 989_999_505_000_000_000_000);
        assert_eq!(pool.staker(&alice()).unwrap().unclaimed, 0);
    }

    #[test]
    fn test_sync_is_idempotent_within_block() {
        let schedule = schedule();
        let mut pool = new_pool();
        let env = BlockEnv::new(11, 1_000);
        sync_and_deposit(&mut pool, &env, 0);

        let later = BlockEnv::new(20, 1_009);
        pool.sync(&later, source(&schedule));
        let once = pool.clone();
        pool.sync(&later, source(&schedule));
        assert_eq!(pool, once);
    }

    #[test]
    fn test_sync_does_not_change_pending() {
        let schedule = schedule();
        let mut pool = new_pool();
        sync_and_deposit(&mut pool, &BlockEnv::new(11, 1_000), 0);

        let later = BlockEnv::new(40, 1_029);
        let before = pool.pending_yield_rewards(&alice(), &later, source(&schedule)).unwrap();
        pool.sync(&later, source(&schedule));
        let after = pool.pending_yield_rewards(&alice(), &later, source(&schedule)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_no_accrual_after_end_block() {
        let schedule = EmissionSchedule::new(100, 10, 10, 20).unwrap();
        let mut pool = new_pool();
        let env = BlockEnv::new(11, 1_000);
        pool.sync(&env, source(&schedule));
        pool.deposit(&alice(), 1_000, 0, &env).unwrap();

        let at_end = pool
            .pending_yield_rewards(&alice(), &BlockEnv::new(20, 1_009), source(&schedule))
            .unwrap();
        let long_after = pool
            .pending_yield_rewards(&alice(), &BlockEnv::new(500, 5_000), source(&schedule))
            .unwrap();
        assert_eq!(at_end, long_after);
        assert!(at_end > 0);
    }

    #[test]
    fn test_lock_validation() {
        let pool = new_pool();
        let env = BlockEnv::new(11, 1_000);
        assert!(pool.validate_lock(0, &env).is_ok());
        assert!(pool.validate_lock(1_000, &env).is_err());
        assert!(pool.validate_lock(1_000 + MAX_LOCK_SECONDS, &env).is_ok());
        assert!(pool.validate_lock(1_001 + MAX_LOCK_SECONDS, &env).is_err());
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let mut pool = new_pool();
        let err = pool.deposit(&alice(), 0, 0, &BlockEnv::new(11, 1_000)).unwrap_err();
        assert!(matches!(err, SyndicateError::InvalidAmount(_)));
    }

    #[test]
    fn test_yield_stake_has_max_weight() {
        let mut pool = new_pool();
        let env = BlockEnv::new(11, 1_000);
        let index = pool.deposit_yield(&alice(), 500, &env).unwrap();
        let stake = pool.stake(&alice(), index).unwrap();
        assert!(stake.is_yield);
        assert_eq!(stake.weight, 500 * YEAR_STAKE_WEIGHT_MULTIPLIER);
        assert_eq!(stake.locked_until, 1_000 + MAX_LOCK_SECONDS);
    }

    #[test]
    fn test_withdraw_locked_stake_fails() {
        let mut pool = new_pool();
        let env = BlockEnv::new(11, 1_000);
        sync_and_deposit(&mut pool, &env, 2_000);
        let err = pool.withdraw(&alice(), 0, 1, &BlockEnv::new(12, 1_500)).unwrap_err();
        assert_eq!(
            err,
            SyndicateError::StakeLocked {
                locked_until: 2_000,
                now: 1_500
            }
        );
    }

    #[test]
    fn test_partial_then_full_withdrawal() {
        let mut pool = new_pool();
        sync_and_deposit(&mut pool, &BlockEnv::new(11, 1_000), 0);
        let env = BlockEnv::new(12, 1_001);

        let withdrawal = pool.withdraw(&alice(), 0, units(400), &env).unwrap();
        assert!(!withdrawal.is_yield);
        let stake = pool.stake(&alice(), 0).unwrap();
        assert_eq!(stake.status, StakeStatus::PartiallyWithdrawn);
        assert_eq!(stake.weight, units(600) * 1_000_000);
        assert_eq!(pool.users_locking_weight(), units(600) * 1_000_000);

        pool.withdraw(&alice(), 0, units(600), &env).unwrap();
        assert_eq!(pool.stake(&alice(), 0).unwrap().status, StakeStatus::Closed);
        assert_eq!(pool.balance_of(&alice()), 0);
        assert_eq!(pool.pool_token_reserve(), 0);

        let err = pool.withdraw(&alice(), 0, 1, &env).unwrap_err();
        assert!(matches!(err, SyndicateError::NotFound(_)));
    }

    #[test]
    fn test_withdraw_more_than_staked() {
        let mut pool = new_pool();
        sync_and_deposit(&mut pool, &BlockEnv::new(11, 1_000), 0);
        let err = pool
            .withdraw(&alice(), 0, units(1_001), &BlockEnv::new(12, 1_001))
            .unwrap_err();
        assert!(matches!(err, SyndicateError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_withdraw_keeps_rewards_unclaimed() {
        let schedule = schedule();
        let mut pool = new_pool();
        sync_and_deposit(&mut pool, &BlockEnv::new(11, 1_000), 0);

        let env = BlockEnv::new(13, 1_002);
        let expected = pool.pending_yield_rewards(&alice(), &env, source(&schedule)).unwrap();
        pool.sync(&env, source(&schedule));
        pool.withdraw(&alice(), 0, units(1_000), &env).unwrap();
        assert_eq!(pool.staker(&alice()).unwrap().unclaimed, expected);
        assert_eq!(pool.pending_yield_rewards(&alice(), &env, source(&schedule)).unwrap(), expected);
    }

    #[test]
    fn test_status_transitions() {
        assert_eq!(
            StakeStatus::Active.after_withdrawal(5).unwrap(),
            StakeStatus::PartiallyWithdrawn
        );
        assert_eq!(
            StakeStatus::PartiallyWithdrawn.after_withdrawal(0).unwrap(),
            StakeStatus::Closed
        );
        assert!(StakeStatus::Closed.after_withdrawal(0).is_err());
    }
}
