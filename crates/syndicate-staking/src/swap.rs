// crates/syndicate-staking/src/swap.rs
//
// One-way conversion of escrowed reward token back into the primary token.
//
// Only the escrow operator may trigger a swap, and only for accounts
// whitelisted as receivers on the escrowed token. The escrow burns from the
// escrowed token and mints on the primary token under its own address, so it
// needs TOKEN_DESTROYER on the former and TOKEN_CREATOR on the latter. Both
// legs are checked before either is applied.

use serde::{Deserialize, Serialize};
use syndicate_core::{AccountId, Amount, Gate, RoleOracle, SyndicateError, Units};
use syndicate_token::{GatedToken, ROLE_WHITE_LISTED_RECEIVER};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEscrow {
    address: AccountId,
    operator: AccountId,
    primary_token: AccountId,
    escrowed_token: AccountId,
}

impl SwapEscrow {
    pub fn new(
        address: AccountId,
        operator: AccountId,
        primary_token: AccountId,
        escrowed_token: AccountId,
    ) -> Self {
        Self {
            address,
            operator,
            primary_token,
            escrowed_token,
        }
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn operator(&self) -> &AccountId {
        &self.operator
    }

    /// Burn `amount` escrowed token from `account` and mint the same amount
    /// of primary token to it.
    pub fn swap(
        &self,
        caller: &AccountId,
        account: &AccountId,
        amount: Amount,
        primary: &mut GatedToken,
        escrowed: &mut GatedToken,
    ) -> Result<(), SyndicateError> {
        if caller != &self.operator {
            return Err(SyndicateError::unauthorized(
                Gate::SwapOperator,
                format!("{} is not the swap operator", caller.short()),
            ));
        }
        if primary.address() != &self.primary_token || escrowed.address() != &self.escrowed_token {
            return Err(SyndicateError::InvalidArgument(
                "swap called with foreign tokens".to_string(),
            ));
        }
        if amount == 0 {
            return Err(SyndicateError::InvalidAmount("swap amount must be positive".to_string()));
        }
        if !escrowed.has_role(account, ROLE_WHITE_LISTED_RECEIVER) {
            return Err(SyndicateError::unauthorized(
                Gate::SwapReceiver,
                format!("{} is not a whitelisted swap receiver", account.short()),
            ));
        }

        escrowed.check_burn(&self.address, account, amount)?;
        primary.check_mint(&self.address, account, amount)?;
        escrowed.burn(&self.address, account, amount)?;
        primary.mint(&self.address, account, amount)?;

        tracing::info!(
            "Swapped {} {} -> {} for {}",
            Units(amount),
            escrowed.symbol(),
            primary.symbol(),
            account.short()
        );
        Ok(())
    }
}
