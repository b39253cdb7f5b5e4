// crates/syndicate-token/src/token.rs
//
// Role-gated fungible token.
//
// The same type backs both the primary token (SYN) and the escrowed reward
// token (sSYN); they differ only in which features are enabled and which
// accounts hold roles. Gates are evaluated in a fixed order, each with its
// own `Gate`:
//   1. receiver  - transfers need TRANSFERS or UNSAFE_TRANSFERS enabled, or a
//                  WHITE_LISTED_RECEIVER destination
//   2. spender   - on-behalf transfers and approvals need TRANSFERS_ON_BEHALF
//                  enabled, or a WHITE_LISTED_SPENDER spender
//   3. delegation - DELEGATIONS for self-service, DELEGATIONS_ON_BEHALF for
//                  signed delegations
//   4. mint/burn - TOKEN_CREATOR / TOKEN_DESTROYER on the caller
//
// Every mutating operation computes all new values first and writes only once
// nothing can fail, so a rejected call leaves the token untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use syndicate_core::crypto::verify_signature;
use syndicate_core::{
    AccountId, Amount, BlockEnv, Gate, Keypair, Mask, RoleOracle, SyndicateError, Units,
};

use crate::access::{
    AccessControl, AdminCap, FEATURE_DELEGATIONS, FEATURE_DELEGATIONS_ON_BEHALF,
    FEATURE_TRANSFERS, FEATURE_TRANSFERS_ON_BEHALF, FEATURE_UNSAFE_TRANSFERS,
    ROLE_TOKEN_CREATOR, ROLE_TOKEN_DESTROYER, ROLE_WHITE_LISTED_RECEIVER,
    ROLE_WHITE_LISTED_SPENDER,
};
use crate::delegation::DelegationIndex;

/// A delegation authorized by the delegator's signature, submitted by anyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedDelegation {
    pub delegator: AccountId,
    pub delegatee: AccountId,
    pub nonce: u64,
    /// Block timestamp after which the authorization is void.
    pub expiry: u64,
    pub signature: Vec<u8>,
}

impl SignedDelegation {
    /// Sign a delegation of `keypair`'s voting power on `token` to `delegatee`.
    pub fn sign(
        keypair: &Keypair,
        token: &AccountId,
        delegatee: &AccountId,
        nonce: u64,
        expiry: u64,
    ) -> Self {
        let message = delegation_message(token, delegatee, nonce, expiry);
        Self {
            delegator: keypair.account(),
            delegatee: *delegatee,
            nonce,
            expiry,
            signature: keypair.sign(&message),
        }
    }
}

/// Bytes signed for a delegation: domain tag, token, delegatee, nonce, expiry.
pub fn delegation_message(
    token: &AccountId,
    delegatee: &AccountId,
    nonce: u64,
    expiry: u64,
) -> Vec<u8> {
    let mut message = b"syndicate:delegate:".to_vec();
    message.extend_from_slice(token.as_bytes());
    message.extend_from_slice(delegatee.as_bytes());
    message.extend_from_slice(&nonce.to_le_bytes());
    message.extend_from_slice(&expiry.to_le_bytes());
    message
}

/// New balances and allowance computed before any write.
struct TransferPlan {
    from_balance: Amount,
    to_balance: Amount,
    allowance: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatedToken {
    address: AccountId,
    symbol: String,
    access: AccessControl,
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<AccountId, HashMap<AccountId, Amount>>,
    total_supply: Amount,
    max_total_supply: Option<Amount>,
    delegation: DelegationIndex,
    nonces: HashMap<AccountId, u64>,
}

impl GatedToken {
    /// Create an empty token whose `admins` hold full privileges.
    pub fn new(address: AccountId, symbol: impl Into<String>, admins: &[AccountId]) -> Self {
        let symbol = symbol.into();
        tracing::info!("Token {} created at {}", symbol, address.short());
        Self {
            address,
            symbol,
            access: AccessControl::new(admins),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
            max_total_supply: None,
            delegation: DelegationIndex::new(),
            nonces: HashMap::new(),
        }
    }

    /// Cap the total supply.
    pub fn with_max_total_supply(mut self, cap: Amount) -> Self {
        self.max_total_supply = Some(cap);
        self
    }

    /// Mint `amount` to `holder` at construction, bypassing role checks.
    pub fn with_initial_supply(mut self, holder: &AccountId, amount: Amount) -> Result<Self, SyndicateError> {
        let to_balance = self.plan_credit(holder, amount)?;
        self.apply_mint(holder, amount, to_balance);
        Ok(self)
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Every account with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.balances.iter()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn max_total_supply(&self) -> Option<Amount> {
        self.max_total_supply
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn voting_power(&self, account: &AccountId) -> Amount {
        self.delegation.voting_power(account)
    }

    pub fn delegate_of(&self, account: &AccountId) -> Option<AccountId> {
        self.delegation.delegate_of(account)
    }

    pub fn delegation(&self) -> &DelegationIndex {
        &self.delegation
    }

    /// Next nonce expected in a signed delegation from `account`.
    pub fn nonce(&self, account: &AccountId) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    // ---------------------------------------------------------------------
    // Administration
    // ---------------------------------------------------------------------

    pub fn admin_cap(&self, caller: &AccountId) -> Result<AdminCap, SyndicateError> {
        self.access.admin_cap(caller)
    }

    pub fn update_role_with(
        &mut self,
        cap: AdminCap,
        account: &AccountId,
        mask: Mask,
    ) -> Result<Mask, SyndicateError> {
        self.access.update_role(cap, account, mask)
    }

    pub fn update_features_with(&mut self, cap: AdminCap, mask: Mask) -> Result<Mask, SyndicateError> {
        self.access.update_features(cap, mask)
    }

    /// Issue a fresh capability for `caller` and replace `account`'s role mask.
    pub fn update_role(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        mask: Mask,
    ) -> Result<Mask, SyndicateError> {
        let cap = self.admin_cap(caller)?;
        self.update_role_with(cap, account, mask)
    }

    /// Issue a fresh capability for `caller` and replace the feature mask.
    pub fn update_features(&mut self, caller: &AccountId, mask: Mask) -> Result<Mask, SyndicateError> {
        let cap = self.admin_cap(caller)?;
        self.update_features_with(cap, mask)
    }

    // ---------------------------------------------------------------------
    // Gates
    // ---------------------------------------------------------------------

    fn check_receiver(&self, to: &AccountId) -> Result<(), SyndicateError> {
        if self.is_feature_enabled(FEATURE_TRANSFERS)
            || self.is_feature_enabled(FEATURE_UNSAFE_TRANSFERS)
            || self.has_role(to, ROLE_WHITE_LISTED_RECEIVER)
        {
            return Ok(());
        }
        Err(SyndicateError::unauthorized(
            Gate::Receiver,
            format!("{}: non allowed receiver {}", self.symbol, to.short()),
        ))
    }

    fn check_spender(&self, spender: &AccountId) -> Result<(), SyndicateError> {
        if self.is_feature_enabled(FEATURE_TRANSFERS_ON_BEHALF)
            || self.has_role(spender, ROLE_WHITE_LISTED_SPENDER)
        {
            return Ok(());
        }
        Err(SyndicateError::unauthorized(
            Gate::Spender,
            format!("{}: spender not allowed {}", self.symbol, spender.short()),
        ))
    }

    // ---------------------------------------------------------------------
    // Transfers and allowances
    // ---------------------------------------------------------------------

    /// Move `amount` from `caller` to `to`.
    pub fn transfer(&mut self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<(), SyndicateError> {
        self.transfer_from(caller, caller, to, amount)
    }

    /// Move `amount` from `from` to `to`. When `caller != from` the move
    /// spends `caller`'s allowance.
    pub fn transfer_from(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), SyndicateError> {
        let plan = self.plan_transfer(caller, from, to, amount)?;

        if let Some(remaining) = plan.allowance {
            self.set_allowance(from, caller, remaining);
        }
        self.set_balance(from, plan.from_balance);
        self.set_balance(to, plan.to_balance);
        self.delegation.on_balance_moved(Some(from), Some(to), amount);

        tracing::debug!(
            "{} transfer {} -> {}: {}",
            self.symbol,
            from.short(),
            to.short(),
            Units(amount)
        );
        Ok(())
    }

    fn plan_transfer(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<TransferPlan, SyndicateError> {
        if to.is_zero() {
            return Err(SyndicateError::InvalidArgument(
                "receiver is the zero account".to_string(),
            ));
        }
        if from == to {
            return Err(SyndicateError::InvalidArgument(format!(
                "sender and receiver are the same ({})",
                from.short()
            )));
        }

        self.check_receiver(to)?;

        let allowance = if caller != from {
            self.check_spender(caller)?;
            let available = self.allowance(from, caller);
            let remaining = available.checked_sub(amount).ok_or(
                SyndicateError::InsufficientAllowance {
                    requested: amount,
                    available,
                },
            )?;
            Some(remaining)
        } else {
            None
        };

        let available = self.balance_of(from);
        let from_balance = available
            .checked_sub(amount)
            .ok_or(SyndicateError::InsufficientBalance {
                requested: amount,
                available,
            })?;
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| SyndicateError::InvalidAmount("receiver balance overflow".to_string()))?;

        Ok(TransferPlan {
            from_balance,
            to_balance,
            allowance,
        })
    }

    /// Allow `spender` to move up to `amount` of `owner`'s balance.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<(), SyndicateError> {
        if spender.is_zero() {
            return Err(SyndicateError::InvalidArgument(
                "spender is the zero account".to_string(),
            ));
        }
        self.check_spender(spender)?;
        self.set_allowance(owner, spender, amount);
        tracing::debug!(
            "{} approve {} -> {}: {}",
            self.symbol,
            owner.short(),
            spender.short(),
            Units(amount)
        );
        Ok(())
    }

    pub fn increase_allowance(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<Amount, SyndicateError> {
        let updated = self
            .allowance(owner, spender)
            .checked_add(amount)
            .ok_or_else(|| SyndicateError::InvalidAmount("allowance overflow".to_string()))?;
        self.approve(owner, spender, updated)?;
        Ok(updated)
    }

    pub fn decrease_allowance(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<Amount, SyndicateError> {
        let available = self.allowance(owner, spender);
        let updated = available
            .checked_sub(amount)
            .ok_or(SyndicateError::InsufficientAllowance {
                requested: amount,
                available,
            })?;
        self.approve(owner, spender, updated)?;
        Ok(updated)
    }

    // ---------------------------------------------------------------------
    // Mint and burn
    // ---------------------------------------------------------------------

    /// Check that `caller` could mint `amount` to `to` right now.
    pub fn check_mint(&self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<(), SyndicateError> {
        self.plan_mint(caller, to, amount).map(|_| ())
    }

    fn plan_mint(&self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<Amount, SyndicateError> {
        if !self.has_role(caller, ROLE_TOKEN_CREATOR) {
            return Err(SyndicateError::unauthorized(
                Gate::Mint,
                format!("{}: {} is not a token creator", self.symbol, caller.short()),
            ));
        }
        self.plan_credit(to, amount)
    }

    fn plan_credit(&self, to: &AccountId, amount: Amount) -> Result<Amount, SyndicateError> {
        if to.is_zero() {
            return Err(SyndicateError::InvalidArgument(
                "cannot mint to the zero account".to_string(),
            ));
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| SyndicateError::InvalidAmount("total supply overflow".to_string()))?;
        if let Some(cap) = self.max_total_supply {
            if supply > cap {
                return Err(SyndicateError::InvalidAmount(format!(
                    "{}: minting {} exceeds max total supply {}",
                    self.symbol,
                    Units(amount),
                    Units(cap)
                )));
            }
        }
        self.balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| SyndicateError::InvalidAmount("receiver balance overflow".to_string()))
    }

    pub fn mint(&mut self, caller: &AccountId, to: &AccountId, amount: Amount) -> Result<(), SyndicateError> {
        let to_balance = self.plan_mint(caller, to, amount)?;
        self.apply_mint(to, amount, to_balance);
        Ok(())
    }

    fn apply_mint(&mut self, to: &AccountId, amount: Amount, to_balance: Amount) {
        self.total_supply += amount;
        self.set_balance(to, to_balance);
        self.delegation.on_balance_moved(None, Some(to), amount);
        tracing::debug!("{} mint {}: {}", self.symbol, to.short(), Units(amount));
    }

    /// Check that `caller` could burn `amount` from `from` right now.
    pub fn check_burn(&self, caller: &AccountId, from: &AccountId, amount: Amount) -> Result<(), SyndicateError> {
        self.plan_burn(caller, from, amount).map(|_| ())
    }

    fn plan_burn(&self, caller: &AccountId, from: &AccountId, amount: Amount) -> Result<Amount, SyndicateError> {
        if !self.has_role(caller, ROLE_TOKEN_DESTROYER) {
            return Err(SyndicateError::unauthorized(
                Gate::Burn,
                format!("{}: {} is not a token destroyer", self.symbol, caller.short()),
            ));
        }
        let available = self.balance_of(from);
        available
            .checked_sub(amount)
            .ok_or(SyndicateError::InsufficientBalance {
                requested: amount,
                available,
            })
    }

    pub fn burn(&mut self, caller: &AccountId, from: &AccountId, amount: Amount) -> Result<(), SyndicateError> {
        let from_balance = self.plan_burn(caller, from, amount)?;
        // balance <= total supply, so this cannot underflow
        self.total_supply -= amount;
        self.set_balance(from, from_balance);
        self.delegation.on_balance_moved(Some(from), None, amount);
        tracing::debug!("{} burn {}: {}", self.symbol, from.short(), Units(amount));
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Delegation
    // ---------------------------------------------------------------------

    /// Delegate `caller`'s voting power to `to` (zero account to clear).
    pub fn delegate(&mut self, caller: &AccountId, to: &AccountId) -> Result<(), SyndicateError> {
        if !self.is_feature_enabled(FEATURE_DELEGATIONS) {
            return Err(SyndicateError::unauthorized(
                Gate::Delegation,
                format!("{}: delegations are disabled", self.symbol),
            ));
        }
        self.apply_delegation(caller, to);
        Ok(())
    }

    /// Delegate on behalf of the signer of `delegation`.
    pub fn delegate_with_sig(
        &mut self,
        delegation: &SignedDelegation,
        env: &BlockEnv,
    ) -> Result<(), SyndicateError> {
        if !self.is_feature_enabled(FEATURE_DELEGATIONS_ON_BEHALF) {
            return Err(SyndicateError::unauthorized(
                Gate::Delegation,
                format!("{}: delegations on behalf are disabled", self.symbol),
            ));
        }
        if env.timestamp >= delegation.expiry {
            return Err(SyndicateError::InvalidArgument(format!(
                "signed delegation expired at {}",
                delegation.expiry
            )));
        }
        let expected = self.nonce(&delegation.delegator);
        if delegation.nonce != expected {
            return Err(SyndicateError::InvalidArgument(format!(
                "invalid nonce {} (expected {})",
                delegation.nonce, expected
            )));
        }
        let message = delegation_message(
            &self.address,
            &delegation.delegatee,
            delegation.nonce,
            delegation.expiry,
        );
        if !verify_signature(&delegation.delegator, &message, &delegation.signature)? {
            return Err(SyndicateError::Crypto(
                "delegation signature does not verify".to_string(),
            ));
        }

        self.nonces.insert(delegation.delegator, expected + 1);
        self.apply_delegation(&delegation.delegator, &delegation.delegatee);
        Ok(())
    }

    fn apply_delegation(&mut self, delegator: &AccountId, to: &AccountId) {
        let balance = self.balance_of(delegator);
        let previous = self.delegation.set_delegate(delegator, to, balance);
        tracing::debug!(
            "{} delegate {}: {:?} -> {}",
            self.symbol,
            delegator.short(),
            previous.map(|p| p.short()),
            to.short()
        );
    }

    // ---------------------------------------------------------------------
    // Storage helpers
    // ---------------------------------------------------------------------

    fn set_balance(&mut self, account: &AccountId, balance: Amount) {
        if balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, balance);
        }
    }

    fn set_allowance(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        if amount == 0 {
            if let Some(m) = self.allowances.get_mut(owner) {
                m.remove(spender);
                if m.is_empty() {
                    self.allowances.remove(owner);
                }
            }
        } else {
            self.allowances
                .entry(*owner)
                .or_default()
                .insert(*spender, amount);
        }
    }
}

impl RoleOracle for GatedToken {
    fn user_roles(&self, account: &AccountId) -> Mask {
        self.access.user_roles(account)
    }

    fn features(&self) -> Mask {
        self.access.features()
    }
}
