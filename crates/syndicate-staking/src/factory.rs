// crates/syndicate-staking/src/factory.rs
//
// Pool registry and emission owner.
//
// The factory holds the emission schedule and the weight of every pool it
// created. A pool's share of the emission is its weight over the total
// weight of all pools. At most one pool exists per staked asset; the pool
// staking the primary token is the core pool, which also receives
// compounded rewards from every other pool.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use syndicate_core::{AccountId, Amount, BlockEnv, Gate, SyndicateError};

use crate::emission::EmissionSchedule;
use crate::pool::{RewardSource, StakePool};
use crate::rewards::LockCurve;

/// Summary of a registered pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolData {
    pub pool_token: AccountId,
    pub pool_address: AccountId,
    pub weight: u32,
    pub is_core: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolFactory {
    address: AccountId,
    owner: AccountId,
    primary_token: AccountId,
    escrowed_token: AccountId,
    schedule: EmissionSchedule,
    lock_curve: LockCurve,
    /// Pools keyed by their own address.
    pools: BTreeMap<AccountId, StakePool>,
    /// Staked asset -> pool address.
    pools_by_asset: BTreeMap<AccountId, AccountId>,
    total_weight: u32,
}

impl PoolFactory {
    pub fn new(
        address: AccountId,
        owner: AccountId,
        primary_token: AccountId,
        escrowed_token: AccountId,
        schedule: EmissionSchedule,
        lock_curve: LockCurve,
    ) -> Self {
        Self {
            address,
            owner,
            primary_token,
            escrowed_token,
            schedule,
            lock_curve,
            pools: BTreeMap::new(),
            pools_by_asset: BTreeMap::new(),
            total_weight: 0,
        }
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn primary_token(&self) -> &AccountId {
        &self.primary_token
    }

    pub fn escrowed_token(&self) -> &AccountId {
        &self.escrowed_token
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    pub fn reward_per_block_at(&self, block: u64) -> Amount {
        self.schedule.reward_per_block_at(block)
    }

    pub fn reward_source(&self) -> RewardSource<'_> {
        RewardSource {
            schedule: &self.schedule,
            total_weight: self.total_weight,
        }
    }

    /// Reject callers other than the factory owner.
    pub fn require_owner(&self, caller: &AccountId) -> Result<(), SyndicateError> {
        if caller != &self.owner {
            return Err(SyndicateError::unauthorized(
                Gate::FactoryOwner,
                format!("{} is not the factory owner", caller.short()),
            ));
        }
        Ok(())
    }

    /// Deterministic address of the pool for `asset`.
    pub fn derive_pool_address(&self, asset: &AccountId) -> AccountId {
        AccountId::derive("pool", &[&self.address, asset])
    }

    /// Register a pool for `asset` with emission `weight`, starting its
    /// reward accounting at `init_block`. The pool for the primary token
    /// becomes the core pool.
    pub fn create_pool(
        &mut self,
        caller: &AccountId,
        asset: &AccountId,
        init_block: u64,
        weight: u32,
    ) -> Result<AccountId, SyndicateError> {
        self.require_owner(caller)?;
        if asset.is_zero() {
            return Err(SyndicateError::InvalidArgument("pool asset cannot be the zero account".to_string()));
        }
        if self.pools_by_asset.contains_key(asset) {
            return Err(SyndicateError::InvalidState(format!(
                "a pool for {} already exists",
                asset.short()
            )));
        }
        let total_weight = self.total_weight.checked_add(weight).ok_or_else(|| {
            SyndicateError::InvalidArgument("total pool weight overflows".to_string())
        })?;

        let address = self.derive_pool_address(asset);
        let is_core = asset == &self.primary_token;
        let pool = StakePool::new(address, *asset, is_core, weight, init_block, self.lock_curve);
        self.pools.insert(address, pool);
        self.pools_by_asset.insert(*asset, address);
        self.total_weight = total_weight;

        tracing::info!(
            "Created {}pool {} for {} with weight {} (total {})",
            if is_core { "core " } else { "" },
            address.short(),
            asset.short(),
            weight,
            total_weight
        );
        Ok(address)
    }

    /// Address of the pool staking `asset`.
    pub fn pool_address(&self, asset: &AccountId) -> Result<AccountId, SyndicateError> {
        self.pools_by_asset
            .get(asset)
            .copied()
            .ok_or_else(|| SyndicateError::NotFound(format!("no pool for {}", asset.short())))
    }

    pub fn core_pool_address(&self) -> Result<AccountId, SyndicateError> {
        self.pool_address(&self.primary_token)
    }

    pub fn pool(&self, address: &AccountId) -> Result<&StakePool, SyndicateError> {
        self.pools
            .get(address)
            .ok_or_else(|| SyndicateError::NotFound(format!("no pool at {}", address.short())))
    }

    pub fn pools(&self) -> impl Iterator<Item = &StakePool> {
        self.pools.values()
    }

    pub fn pool_data(&self, asset: &AccountId) -> Result<PoolData, SyndicateError> {
        let pool = self.pool(&self.pool_address(asset)?)?;
        Ok(PoolData {
            pool_token: *pool.pool_token(),
            pool_address: *pool.address(),
            weight: pool.weight(),
            is_core: pool.is_core(),
        })
    }

    /// Mutable pool plus the emission parameters needed to sync it.
    pub fn pool_mut(
        &mut self,
        address: &AccountId,
    ) -> Result<(&mut StakePool, RewardSource<'_>), SyndicateError> {
        let source = RewardSource {
            schedule: &self.schedule,
            total_weight: self.total_weight,
        };
        let pool = self
            .pools
            .get_mut(address)
            .ok_or_else(|| SyndicateError::NotFound(format!("no pool at {}", address.short())))?;
        Ok((pool, source))
    }

    /// Change the emission weight of the pool staking `asset`.
    ///
    /// Every pool is synced under the old weights first, so blocks already
    /// mined are rewarded at the shares that applied to them.
    pub fn change_pool_weight(
        &mut self,
        caller: &AccountId,
        asset: &AccountId,
        weight: u32,
        env: &BlockEnv,
    ) -> Result<(), SyndicateError> {
        self.require_owner(caller)?;
        let address = self.pool_address(asset)?;
        let previous = self.pool(&address)?.weight();
        let total_weight = (self.total_weight - previous)
            .checked_add(weight)
            .ok_or_else(|| SyndicateError::InvalidArgument("total pool weight overflows".to_string()))?;

        let source = RewardSource {
            schedule: &self.schedule,
            total_weight: self.total_weight,
        };
        for pool in self.pools.values_mut() {
            pool.sync(env, source);
        }
        if let Some(pool) = self.pools.get_mut(&address) {
            pool.set_weight(weight);
        }
        self.total_weight = total_weight;

        tracing::info!(
            "Pool {} weight changed {} -> {} (total {})",
            address.short(),
            previous,
            weight,
            total_weight
        );
        Ok(())
    }

    /// Pending rewards of `account` in the pool at `address`, at `env`.
    pub fn pending_yield_rewards(
        &self,
        address: &AccountId,
        account: &AccountId,
        env: &BlockEnv,
    ) -> Result<Amount, SyndicateError> {
        self.pool(address)?
            .pending_yield_rewards(account, env, self.reward_source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syndicate_core::units;

    fn owner() -> AccountId {
        AccountId::from_label("owner")
    }

    fn syn() -> AccountId {
        AccountId::from_label("SYN")
    }

    fn lp() -> AccountId {
        AccountId::from_label("LP")
    }

    fn factory() -> PoolFactory {
        PoolFactory::new(
            AccountId::from_label("factory"),
            owner(),
            syn(),
            AccountId::from_label("sSYN"),
            EmissionSchedule::new(units(990), 91_252, 10, 10 + 7_120_725).unwrap(),
            LockCurve::default(),
        )
    }

    #[test]
    fn test_create_core_pool() {
        let mut factory = factory();
        let address = factory.create_pool(&owner(), &syn(), 10, 200).unwrap();
        let data = factory.pool_data(&syn()).unwrap();
        assert_eq!(data.pool_address, address);
        assert!(data.is_core);
        assert_eq!(data.weight, 200);
        assert_eq!(factory.total_weight(), 200);
        assert_eq!(factory.core_pool_address().unwrap(), address);
    }

    #[test]
    fn test_non_owner_cannot_create_pool() {
        let mut factory = factory();
        let err = factory
            .create_pool(&AccountId::from_label("mallory"), &syn(), 10, 200)
            .unwrap_err();
        assert_eq!(err.gate(), Some(Gate::FactoryOwner));
    }

    #[test]
    fn test_duplicate_pool_rejected() {
        let mut factory = factory();
        factory.create_pool(&owner(), &syn(), 10, 200).unwrap();
        let err = factory.create_pool(&owner(), &syn(), 11, 100).unwrap_err();
        assert!(matches!(err, SyndicateError::InvalidState(_)));
        assert_eq!(factory.total_weight(), 200);
    }

    #[test]
    fn test_unknown_pool() {
        let factory = factory();
        assert!(matches!(
            factory.pool_address(&lp()).unwrap_err(),
            SyndicateError::NotFound(_)
        ));
    }

    #[test]
    fn test_pool_address_is_deterministic() {
        let mut a = factory();
        let b = factory();
        let address = a.create_pool(&owner(), &lp(), 10, 800).unwrap();
        assert_eq!(address, b.derive_pool_address(&lp()));
        assert!(!a.pool(&address).unwrap().is_core());
    }

    #[test]
    fn test_change_pool_weight() {
        let mut factory = factory();
        let core = factory.create_pool(&owner(), &syn(), 10, 200).unwrap();
        factory.create_pool(&owner(), &lp(), 10, 800).unwrap();
        factory
            .change_pool_weight(&owner(), &syn(), 400, &BlockEnv::new(20, 100))
            .unwrap();
        assert_eq!(factory.total_weight(), 1_200);
        assert_eq!(factory.pool(&core).unwrap().weight(), 400);
        assert_eq!(factory.pool(&core).unwrap().last_yield_distribution(), 20);
    }

    #[test]
    fn test_weight_change_keeps_past_shares() {
        let mut factory = factory();
        let core = factory.create_pool(&owner(), &syn(), 10, 200).unwrap();
        factory.create_pool(&owner(), &lp(), 10, 200).unwrap();
        let alice = AccountId::from_label("alice");

        let env = BlockEnv::new(11, 1_000);
        let (pool, source) = factory.pool_mut(&core).unwrap();
        pool.sync(&env, source);
        pool.deposit(&alice, units(1), 0, &env).unwrap();

        let later = BlockEnv::new(21, 1_010);
        let before = factory.pending_yield_rewards(&core, &alice, &later).unwrap();
        factory.change_pool_weight(&owner(), &syn(), 600, &later).unwrap();
        let after = factory.pending_yield_rewards(&core, &alice, &later).unwrap();
        assert_eq!(before, after);
        // half of 10 blocks of emission, minus truncation dust
        assert!(units(4_950) - before < 1_000_000);
    }
}
