// crates/syndicate-staking/src/ledger.rs
//
// In-memory ledger substrate.
//
// Executes operations one at a time in a single total order. Each mutating
// call is one transaction: with automine on, a new block is opened first
// (number + 1, timestamp + 1), then the body runs against a checkpoint of the
// whole ledger and is rolled back if it fails. Reads never advance the chain.
//
// The ledger owns the primary token, the escrowed reward token, any other
// registered pool assets, the pool factory and the swap escrow, and moves
// tokens around the pools' bookkeeping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use syndicate_core::{units, AccountId, Amount, BlockEnv, Mask, SyndicateError, Units};
use syndicate_token::{GatedToken, SignedDelegation, ROLE_TOKEN_CREATOR};

use crate::emission::{EmissionSchedule, DEFAULT_DECAY_DENOMINATOR, DEFAULT_DECAY_NUMERATOR};
use crate::factory::PoolFactory;
use crate::pool::Stake;
use crate::rewards::LockCurve;
use crate::swap::SwapEscrow;

/// Parameters of a fresh deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployParams {
    pub deployer: AccountId,
    pub super_admin: AccountId,
    pub fund_owner: AccountId,
    pub primary_symbol: String,
    pub escrowed_symbol: String,
    /// Primary supply minted to the fund owner.
    pub initial_supply: Amount,
    pub max_total_supply: Amount,
    pub reward_per_block: Amount,
    pub blocks_per_update: u64,
    /// Number of blocks, from genesis, that emit rewards.
    pub emission_blocks: u64,
    pub decay_numerator: u128,
    pub decay_denominator: u128,
    pub lock_curve: LockCurve,
    pub genesis: BlockEnv,
    pub automine: bool,
}

impl Default for DeployParams {
    fn default() -> Self {
        Self {
            deployer: AccountId::from_label("deployer"),
            super_admin: AccountId::from_label("super-admin"),
            fund_owner: AccountId::from_label("fund-owner"),
            primary_symbol: "SYN".to_string(),
            escrowed_symbol: "sSYN".to_string(),
            initial_supply: units(7_000_000_000),
            max_total_supply: units(10_000_000_000),
            reward_per_block: units(990),
            blocks_per_update: 91_252,
            emission_blocks: 7_120_725,
            decay_numerator: DEFAULT_DECAY_NUMERATOR,
            decay_denominator: DEFAULT_DECAY_DENOMINATOR,
            lock_curve: LockCurve::default(),
            genesis: BlockEnv::new(0, 0),
            automine: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    env: BlockEnv,
    automine: bool,
    primary: GatedToken,
    escrowed: GatedToken,
    /// Pool assets other than the primary token.
    assets: BTreeMap<AccountId, GatedToken>,
    factory: PoolFactory,
    swap: SwapEscrow,
}

impl Ledger {
    /// Deploy both tokens, the factory and the swap escrow at the genesis block.
    ///
    /// The deployer and the super admin hold full privileges on both tokens,
    /// the fund owner receives the initial primary supply, and the factory
    /// may mint primary token to pay out compounded principal.
    pub fn deploy(params: &DeployParams) -> Result<Self, SyndicateError> {
        let admins = [params.deployer, params.super_admin];

        let primary_address =
            AccountId::derive(&format!("token:{}", params.primary_symbol), &[&params.deployer]);
        let escrowed_address =
            AccountId::derive(&format!("token:{}", params.escrowed_symbol), &[&params.deployer]);
        if primary_address == escrowed_address {
            return Err(SyndicateError::InvalidArgument(
                "primary and escrowed tokens need distinct symbols".to_string(),
            ));
        }

        let mut primary = GatedToken::new(primary_address, params.primary_symbol.clone(), &admins)
            .with_max_total_supply(params.max_total_supply)
            .with_initial_supply(&params.fund_owner, params.initial_supply)?;
        let escrowed = GatedToken::new(escrowed_address, params.escrowed_symbol.clone(), &admins);

        let start = params.genesis.number;
        let end = start.checked_add(params.emission_blocks).ok_or_else(|| {
            SyndicateError::InvalidArgument("emission end block overflows".to_string())
        })?;
        let schedule = EmissionSchedule::new(params.reward_per_block, params.blocks_per_update, start, end)?
            .with_decay(params.decay_numerator, params.decay_denominator)?;

        let factory_address = AccountId::derive("factory", &[&params.deployer]);
        primary.update_role(&params.deployer, &factory_address, ROLE_TOKEN_CREATOR)?;
        let factory = PoolFactory::new(
            factory_address,
            params.deployer,
            primary_address,
            escrowed_address,
            schedule,
            params.lock_curve,
        );
        let swap = SwapEscrow::new(
            AccountId::derive("swap", &[&params.deployer]),
            params.super_admin,
            primary_address,
            escrowed_address,
        );

        tracing::info!(
            "Deployed {} at {}, {} at {}, factory at {}, swap at {} (block {})",
            params.primary_symbol,
            primary_address.short(),
            params.escrowed_symbol,
            escrowed_address.short(),
            factory_address.short(),
            swap.address().short(),
            params.genesis.number
        );

        Ok(Self {
            env: params.genesis,
            automine: params.automine,
            primary,
            escrowed,
            assets: BTreeMap::new(),
            factory,
            swap,
        })
    }

    // ---------------------------------------------------------------------
    // Substrate
    // ---------------------------------------------------------------------

    pub fn env(&self) -> BlockEnv {
        self.env
    }

    pub fn automine(&self) -> bool {
        self.automine
    }

    pub fn set_automine(&mut self, automine: bool) {
        self.automine = automine;
    }

    /// Open a new empty block.
    pub fn mine(&mut self) {
        self.env = self.env.next();
        tracing::debug!("Mined block {} at {}", self.env.number, self.env.timestamp);
    }

    pub fn mine_blocks(&mut self, count: u64) {
        for _ in 0..count {
            self.mine();
        }
    }

    /// Move the clock forward without opening a block.
    pub fn increase_time(&mut self, seconds: u64) {
        self.env.timestamp = self.env.timestamp.saturating_add(seconds);
        tracing::debug!("Clock advanced by {}s to {}", seconds, self.env.timestamp);
    }

    /// Run `op` as one atomic transaction.
    pub fn execute<T, F>(&mut self, op: F) -> Result<T, SyndicateError>
    where
        F: FnOnce(&mut Ledger) -> Result<T, SyndicateError>,
    {
        if self.automine {
            self.env = self.env.next();
        }
        let checkpoint = self.clone();
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::debug!("Transaction reverted in block {}: {}", self.env.number, err);
                *self = checkpoint;
                Err(err)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn primary(&self) -> &GatedToken {
        &self.primary
    }

    pub fn escrowed(&self) -> &GatedToken {
        &self.escrowed
    }

    pub fn factory(&self) -> &PoolFactory {
        &self.factory
    }

    pub fn swap_escrow(&self) -> &SwapEscrow {
        &self.swap
    }

    pub fn token(&self, address: &AccountId) -> Result<&GatedToken, SyndicateError> {
        if address == self.primary.address() {
            Ok(&self.primary)
        } else if address == self.escrowed.address() {
            Ok(&self.escrowed)
        } else {
            self.assets
                .get(address)
                .ok_or_else(|| SyndicateError::NotFound(format!("no token at {}", address.short())))
        }
    }

    fn token_mut(&mut self, address: &AccountId) -> Result<&mut GatedToken, SyndicateError> {
        if address == self.primary.address() {
            Ok(&mut self.primary)
        } else if address == self.escrowed.address() {
            Ok(&mut self.escrowed)
        } else {
            self.assets
                .get_mut(address)
                .ok_or_else(|| SyndicateError::NotFound(format!("no token at {}", address.short())))
        }
    }

    pub fn token_by_symbol(&self, symbol: &str) -> Result<&GatedToken, SyndicateError> {
        std::iter::once(&self.primary)
            .chain(std::iter::once(&self.escrowed))
            .chain(self.assets.values())
            .find(|t| t.symbol().eq_ignore_ascii_case(symbol))
            .ok_or_else(|| SyndicateError::NotFound(format!("no token with symbol {}", symbol)))
    }

    pub fn balance_of(&self, token: &AccountId, account: &AccountId) -> Result<Amount, SyndicateError> {
        Ok(self.token(token)?.balance_of(account))
    }

    pub fn voting_power(&self, token: &AccountId, account: &AccountId) -> Result<Amount, SyndicateError> {
        Ok(self.token(token)?.voting_power(account))
    }

    pub fn pool_address(&self, asset: &AccountId) -> Result<AccountId, SyndicateError> {
        self.factory.pool_address(asset)
    }

    pub fn stakes(&self, pool: &AccountId, account: &AccountId) -> Result<&[Stake], SyndicateError> {
        Ok(self.factory.pool(pool)?.stakes_of(account))
    }

    /// Rewards `account` could claim from `pool` in the current block.
    pub fn pending_yield_rewards(&self, pool: &AccountId, account: &AccountId) -> Result<Amount, SyndicateError> {
        self.factory.pending_yield_rewards(pool, account, &self.env)
    }

    // ---------------------------------------------------------------------
    // Token transactions
    // ---------------------------------------------------------------------

    /// Run `op` against one token as a transaction.
    pub fn token_transaction<T, F>(&mut self, token: &AccountId, op: F) -> Result<T, SyndicateError>
    where
        F: FnOnce(&mut GatedToken, &BlockEnv) -> Result<T, SyndicateError>,
    {
        self.execute(|ledger| {
            let env = ledger.env;
            op(ledger.token_mut(token)?, &env)
        })
    }

    /// Register another pool asset.
    pub fn register_token(&mut self, token: GatedToken) -> Result<(), SyndicateError> {
        self.execute(|ledger| {
            let address = *token.address();
            if ledger.token(&address).is_ok() {
                return Err(SyndicateError::InvalidState(format!(
                    "token {} already registered",
                    address.short()
                )));
            }
            tracing::info!("Registered token {} at {}", token.symbol(), address.short());
            ledger.assets.insert(address, token);
            Ok(())
        })
    }

    pub fn transfer(
        &mut self,
        token: &AccountId,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), SyndicateError> {
        self.token_transaction(token, |t, _| t.transfer(caller, to, amount))
    }

    pub fn transfer_from(
        &mut self,
        token: &AccountId,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), SyndicateError> {
        self.token_transaction(token, |t, _| t.transfer_from(caller, from, to, amount))
    }

    pub fn approve(
        &mut self,
        token: &AccountId,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), SyndicateError> {
        self.token_transaction(token, |t, _| t.approve(owner, spender, amount))
    }

    pub fn mint(
        &mut self,
        token: &AccountId,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), SyndicateError> {
        self.token_transaction(token, |t, _| t.mint(caller, to, amount))
    }

    pub fn burn(
        &mut self,
        token: &AccountId,
        caller: &AccountId,
        from: &AccountId,
        amount: Amount,
    ) -> Result<(), SyndicateError> {
        self.token_transaction(token, |t, _| t.burn(caller, from, amount))
    }

    pub fn delegate(&mut self, token: &AccountId, caller: &AccountId, to: &AccountId) -> Result<(), SyndicateError> {
        self.token_transaction(token, |t, _| t.delegate(caller, to))
    }

    pub fn delegate_with_sig(
        &mut self,
        token: &AccountId,
        delegation: &SignedDelegation,
    ) -> Result<(), SyndicateError> {
        self.token_transaction(token, |t, env| t.delegate_with_sig(delegation, env))
    }

    pub fn update_role(
        &mut self,
        token: &AccountId,
        caller: &AccountId,
        account: &AccountId,
        mask: Mask,
    ) -> Result<Mask, SyndicateError> {
        self.token_transaction(token, |t, _| t.update_role(caller, account, mask))
            .map_err(|err| {
                tracing::warn!("Role update by {} rejected: {}", caller.short(), err);
                err
            })
    }

    pub fn update_features(
        &mut self,
        token: &AccountId,
        caller: &AccountId,
        mask: Mask,
    ) -> Result<Mask, SyndicateError> {
        self.token_transaction(token, |t, _| t.update_features(caller, mask))
            .map_err(|err| {
                tracing::warn!("Feature update by {} rejected: {}", caller.short(), err);
                err
            })
    }

    // ---------------------------------------------------------------------
    // Factory
    // ---------------------------------------------------------------------

    /// Create the pool staking `asset`, which must be a known token.
    pub fn create_pool(
        &mut self,
        caller: &AccountId,
        asset: &AccountId,
        init_block: u64,
        weight: u32,
    ) -> Result<AccountId, SyndicateError> {
        self.execute(|ledger| {
            ledger.token(asset)?;
            ledger.factory.create_pool(caller, asset, init_block, weight)
        })
    }

    pub fn change_pool_weight(
        &mut self,
        caller: &AccountId,
        asset: &AccountId,
        weight: u32,
    ) -> Result<(), SyndicateError> {
        self.execute(|ledger| {
            let env = ledger.env;
            ledger.factory.change_pool_weight(caller, asset, weight, &env)
        })
    }

    /// Delegate the voting power of `pool`'s holdings to `to`.
    /// Restricted to the factory owner.
    pub fn delegate_pool_votes(
        &mut self,
        caller: &AccountId,
        pool: &AccountId,
        to: &AccountId,
    ) -> Result<(), SyndicateError> {
        self.execute(|ledger| {
            ledger.factory.require_owner(caller)?;
            let asset = *ledger.factory.pool(pool)?.pool_token();
            ledger.token_mut(&asset)?.delegate(pool, to)
        })
    }

    // ---------------------------------------------------------------------
    // Staking
    // ---------------------------------------------------------------------

    /// Pay `amount` of rewards earned in `pool`: mint escrowed token, or
    /// compound into a yield stake in the core pool when `reinvest` is set.
    fn settle_rewards(
        &mut self,
        pool: &AccountId,
        account: &AccountId,
        amount: Amount,
        reinvest: bool,
    ) -> Result<(), SyndicateError> {
        if amount == 0 {
            return Ok(());
        }
        let env = self.env;
        if reinvest {
            let core = self.factory.core_pool_address()?;
            let (core_pool, source) = self.factory.pool_mut(&core)?;
            core_pool.sync(&env, source);
            core_pool.deposit_yield(account, amount, &env)?;
        } else {
            self.escrowed.mint(pool, account, amount)?;
        }
        tracing::debug!(
            "Settled {} of rewards from pool {} for {} ({})",
            Units(amount),
            pool.short(),
            account.short(),
            if reinvest { "compounded" } else { "escrowed" }
        );
        Ok(())
    }

    /// Deposit `amount` of the pool's asset from `depositor`, locked until
    /// `lock_until` (0 for no lock). Rewards already accrued on the
    /// depositor's stakes are settled first: minted as escrowed token when
    /// `use_escrow` is set, compounded otherwise. Returns the stake index.
    pub fn stake(
        &mut self,
        pool: &AccountId,
        depositor: &AccountId,
        amount: Amount,
        lock_until: u64,
        use_escrow: bool,
    ) -> Result<usize, SyndicateError> {
        self.execute(|ledger| {
            if amount == 0 {
                return Err(SyndicateError::InvalidAmount("stake amount must be positive".to_string()));
            }
            let env = ledger.env;
            let (stake_pool, source) = ledger.factory.pool_mut(pool)?;
            stake_pool.validate_lock(lock_until, &env)?;
            stake_pool.sync(&env, source);
            let pending = stake_pool.claim(depositor)?;
            let asset = *stake_pool.pool_token();

            ledger.settle_rewards(pool, depositor, pending, !use_escrow)?;
            ledger
                .token_mut(&asset)?
                .transfer_from(pool, depositor, pool, amount)?;

            let (stake_pool, _) = ledger.factory.pool_mut(pool)?;
            stake_pool.deposit(depositor, amount, lock_until, &env)
        })
    }

    /// Withdraw `amount` from stake `index`. With `process_rewards_first`
    /// pending rewards are minted as escrowed token; otherwise they stay
    /// claimable. Returns the rewards paid out.
    pub fn unstake(
        &mut self,
        pool: &AccountId,
        account: &AccountId,
        index: usize,
        amount: Amount,
        process_rewards_first: bool,
    ) -> Result<Amount, SyndicateError> {
        self.execute(|ledger| {
            let env = ledger.env;
            let factory_address = *ledger.factory.address();
            let (stake_pool, source) = ledger.factory.pool_mut(pool)?;
            stake_pool.check_withdrawal(account, index, amount, &env)?;
            stake_pool.sync(&env, source);
            let rewards = if process_rewards_first {
                stake_pool.claim(account)?
            } else {
                0
            };
            let withdrawal = stake_pool.withdraw(account, index, amount, &env)?;
            let asset = *stake_pool.pool_token();

            ledger.settle_rewards(pool, account, rewards, false)?;
            if withdrawal.is_yield {
                ledger.primary.mint(&factory_address, account, withdrawal.amount)?;
            } else {
                ledger
                    .token_mut(&asset)?
                    .transfer(pool, account, withdrawal.amount)?;
            }
            Ok(rewards)
        })
    }

    /// Pay out everything `account` has earned in `pool`. Returns the amount.
    pub fn process_rewards(
        &mut self,
        pool: &AccountId,
        account: &AccountId,
        reinvest: bool,
    ) -> Result<Amount, SyndicateError> {
        self.execute(|ledger| {
            let env = ledger.env;
            let (stake_pool, source) = ledger.factory.pool_mut(pool)?;
            stake_pool.sync(&env, source);
            let pending = stake_pool.claim(account)?;
            ledger.settle_rewards(pool, account, pending, reinvest)?;
            Ok(pending)
        })
    }

    // ---------------------------------------------------------------------
    // Swap
    // ---------------------------------------------------------------------

    pub fn swap(&mut self, caller: &AccountId, account: &AccountId, amount: Amount) -> Result<(), SyndicateError> {
        self.execute(|ledger| {
            ledger
                .swap
                .swap(caller, account, amount, &mut ledger.primary, &mut ledger.escrowed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::MAX_LOCK_SECONDS;
    use syndicate_core::Gate;
    use syndicate_token::{FEATURE_TRANSFERS, FEATURE_TRANSFERS_ON_BEHALF};

    fn params() -> DeployParams {
        DeployParams {
            genesis: BlockEnv::new(100, 1_000_000),
            ..DeployParams::default()
        }
    }

    fn user() -> AccountId {
        AccountId::from_label("user")
    }

    /// Ledger with transfers enabled, a funded user and a core pool.
    fn ready() -> (Ledger, AccountId) {
        let p = params();
        let mut ledger = Ledger::deploy(&p).unwrap();
        let syn = *ledger.primary().address();
        let ssyn = *ledger.escrowed().address();
        ledger
            .update_features(&syn, &p.deployer, FEATURE_TRANSFERS | FEATURE_TRANSFERS_ON_BEHALF)
            .unwrap();
        ledger.transfer(&syn, &p.fund_owner, &user(), units(10_000)).unwrap();
        let block = ledger.env().number;
        let pool = ledger.create_pool(&p.deployer, &syn, block, 1).unwrap();
        ledger
            .update_role(&ssyn, &p.super_admin, &pool, ROLE_TOKEN_CREATOR)
            .unwrap();
        ledger.approve(&syn, &user(), &pool, units(10_000)).unwrap();
        (ledger, pool)
    }

    #[test]
    fn test_deploy_genesis_state() {
        let p = params();
        let ledger = Ledger::deploy(&p).unwrap();
        assert_eq!(ledger.env(), p.genesis);
        assert_eq!(ledger.primary().balance_of(&p.fund_owner), units(7_000_000_000));
        assert_eq!(ledger.primary().max_total_supply(), Some(units(10_000_000_000)));
        assert_eq!(ledger.escrowed().total_supply(), 0);
        assert_eq!(ledger.factory().schedule().start_block, 100);
        assert_eq!(ledger.swap_escrow().operator(), &p.super_admin);
    }

    #[test]
    fn test_transaction_opens_block() {
        let (mut ledger, _) = ready();
        let before = ledger.env();
        let syn = *ledger.primary().address();
        ledger.transfer(&syn, &user(), &AccountId::from_label("other"), 1).unwrap();
        assert_eq!(ledger.env(), before.next());
    }

    #[test]
    fn test_failed_transaction_rolls_back_but_consumes_block() {
        let (mut ledger, pool) = ready();
        let before = ledger.env();
        let balance = ledger.primary().balance_of(&user());
        let err = ledger.stake(&pool, &user(), units(20_000), 0, true).unwrap_err();
        assert!(matches!(err, SyndicateError::InsufficientAllowance { .. }));
        assert_eq!(ledger.primary().balance_of(&user()), balance);
        assert!(ledger.stakes(&pool, &user()).unwrap().is_empty());
        assert_eq!(ledger.env().number, before.number + 1);
    }

    #[test]
    fn test_reads_do_not_advance_chain() {
        let (ledger, pool) = ready();
        let before = ledger.env();
        ledger.pending_yield_rewards(&pool, &user()).unwrap();
        assert_eq!(ledger.env(), before);
    }

    #[test]
    fn test_create_pool_for_unknown_token() {
        let p = params();
        let mut ledger = Ledger::deploy(&p).unwrap();
        let err = ledger
            .create_pool(&p.deployer, &AccountId::from_label("nope"), 100, 1)
            .unwrap_err();
        assert!(matches!(err, SyndicateError::NotFound(_)));
    }

    #[test]
    fn test_stake_moves_principal_into_pool() {
        let (mut ledger, pool) = ready();
        let syn = *ledger.primary().address();
        ledger.stake(&pool, &user(), units(1_000), 0, true).unwrap();
        assert_eq!(ledger.primary().balance_of(&user()), units(9_000));
        assert_eq!(ledger.primary().balance_of(&pool), units(1_000));
        assert_eq!(ledger.balance_of(&syn, &pool).unwrap(), units(1_000));
    }

    #[test]
    fn test_unstake_without_processing_keeps_pending() {
        let (mut ledger, pool) = ready();
        ledger.stake(&pool, &user(), units(1_000), 0, true).unwrap();
        ledger.mine_blocks(4);
        let expected = ledger.pending_yield_rewards(&pool, &user()).unwrap();
        ledger.set_automine(false);
        let paid = ledger.unstake(&pool, &user(), 0, units(1_000), false).unwrap();
        assert_eq!(paid, 0);
        assert_eq!(ledger.pending_yield_rewards(&pool, &user()).unwrap(), expected);
        assert_eq!(ledger.escrowed().balance_of(&user()), 0);
        assert_eq!(ledger.primary().balance_of(&user()), units(10_000));
    }

    #[test]
    fn test_process_rewards_mints_escrowed() {
        let (mut ledger, pool) = ready();
        ledger.stake(&pool, &user(), units(1_000), 0, true).unwrap();
        ledger.mine_blocks(2);
        let paid = ledger.process_rewards(&pool, &user(), false).unwrap();
        // sole staker in the only pool: 3 blocks of emission, minus truncation
        assert!(units(2_970) - paid < 1_000_000);
        assert_eq!(ledger.escrowed().balance_of(&user()), paid);
        assert_eq!(ledger.pending_yield_rewards(&pool, &user()).unwrap(), 0);
    }

    #[test]
    fn test_reinvest_creates_double_weight_yield_stake() {
        let (mut ledger, pool) = ready();
        ledger.stake(&pool, &user(), units(1_000), 0, true).unwrap();
        ledger.mine();

        ledger.set_automine(false);
        ledger.mine();
        let paid = ledger.process_rewards(&pool, &user(), true).unwrap();
        assert!(paid > 0);
        let stakes = ledger.stakes(&pool, &user()).unwrap();
        assert_eq!(stakes.len(), 2);
        assert!(stakes[1].is_yield);
        assert_eq!(stakes[1].amount, paid);
        assert_eq!(stakes[1].weight, paid * 2_000_000);
        assert_eq!(ledger.escrowed().balance_of(&user()), 0);

        // same block: nothing left to settle
        assert_eq!(ledger.process_rewards(&pool, &user(), true).unwrap(), 0);
        assert_eq!(ledger.stakes(&pool, &user()).unwrap().len(), 2);
    }

    #[test]
    fn test_yield_unstake_mints_primary() {
        let (mut ledger, pool) = ready();
        ledger.stake(&pool, &user(), units(1_000), 0, true).unwrap();
        ledger.mine();
        let paid = ledger.process_rewards(&pool, &user(), true).unwrap();
        let supply = ledger.primary().total_supply();

        let err = ledger.unstake(&pool, &user(), 1, paid, true).unwrap_err();
        assert!(matches!(err, SyndicateError::StakeLocked { .. }));

        ledger.increase_time(MAX_LOCK_SECONDS + 1);
        ledger.unstake(&pool, &user(), 1, paid, false).unwrap();
        assert_eq!(ledger.primary().total_supply(), supply + paid);
        assert_eq!(ledger.primary().balance_of(&pool), units(1_000));
    }

    #[test]
    fn test_locked_unstake_rejected() {
        let (mut ledger, pool) = ready();
        let lock_until = ledger.env().timestamp + 1_000;
        ledger.stake(&pool, &user(), units(1_000), lock_until, true).unwrap();
        let err = ledger.unstake(&pool, &user(), 0, units(1), true).unwrap_err();
        assert!(matches!(err, SyndicateError::StakeLocked { .. }));
        assert_eq!(ledger.primary().balance_of(&pool), units(1_000));
    }

    #[test]
    fn test_stake_requires_escrow_minter_role() {
        let p = params();
        let mut ledger = Ledger::deploy(&p).unwrap();
        let syn = *ledger.primary().address();
        ledger
            .update_features(&syn, &p.deployer, FEATURE_TRANSFERS | FEATURE_TRANSFERS_ON_BEHALF)
            .unwrap();
        ledger.transfer(&syn, &p.fund_owner, &user(), units(10)).unwrap();
        let block = ledger.env().number;
        let pool = ledger.create_pool(&p.deployer, &syn, block, 1).unwrap();
        ledger.approve(&syn, &user(), &pool, units(10)).unwrap();

        ledger.stake(&pool, &user(), units(5), 0, true).unwrap();
        let err = ledger.stake(&pool, &user(), units(5), 0, true).unwrap_err();
        assert_eq!(err.gate(), Some(Gate::Mint));
        assert_eq!(ledger.primary().balance_of(&user()), units(5));
    }

    #[test]
    fn test_only_factory_owner_delegates_pool_votes() {
        let (mut ledger, pool) = ready();
        let err = ledger
            .delegate_pool_votes(&user(), &pool, &user())
            .unwrap_err();
        assert_eq!(err.gate(), Some(Gate::FactoryOwner));
    }

    #[test]
    fn test_clock_saturates_at_max_timestamp() {
        let (mut ledger, pool) = ready();
        let before = ledger.env();
        ledger.increase_time(u64::MAX);
        ledger.mine();
        assert_eq!(ledger.env(), BlockEnv::new(before.number + 1, u64::MAX));

        let syn = *ledger.primary().address();
        ledger.approve(&syn, &user(), &pool, 1).unwrap();
        assert_eq!(ledger.env(), BlockEnv::new(before.number + 2, u64::MAX));
    }

    #[test]
    fn test_state_survives_json_round_trip() {
        let (mut ledger, pool) = ready();
        let syn = *ledger.primary().address();
        ledger
            .stake(&pool, &user(), units(1_000), 0, true)
            .unwrap();
        ledger.mine_blocks(3);

        let json = serde_json::to_string(&ledger).unwrap();
        let restored: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.env(), ledger.env());
        assert_eq!(restored.escrowed().total_supply(), ledger.escrowed().total_supply());
        assert_eq!(
            restored.balance_of(&syn, &user()).unwrap(),
            ledger.balance_of(&syn, &user()).unwrap()
        );
        assert_eq!(
            restored.pending_yield_rewards(&pool, &user()).unwrap(),
            ledger.pending_yield_rewards(&pool, &user()).unwrap()
        );
    }
}
