// crates/syndicate-token/src/delegation.rs
//
// Single-hop vote delegation bookkeeping.
//
// `delegates` is the adjacency (delegator -> delegate), `delegators` the
// reverse index, and `voting_power` the cached sum of balances currently
// delegated to each account. An account that never delegated contributes to
// nobody; self-delegation makes its own balance count. Delegation does not
// chain: power delegated to B stays with B even if B delegates elsewhere.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use syndicate_core::{AccountId, Amount};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelegationIndex {
    delegates: HashMap<AccountId, AccountId>,
    delegators: HashMap<AccountId, BTreeSet<AccountId>>,
    voting_power: HashMap<AccountId, Amount>,
}

impl DelegationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current delegate of `account`, if any.
    pub fn delegate_of(&self, account: &AccountId) -> Option<AccountId> {
        self.delegates.get(account).copied()
    }

    /// Accounts currently delegating to `delegate`.
    pub fn delegators_of(&self, delegate: &AccountId) -> Vec<AccountId> {
        self.delegators
            .get(delegate)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn voting_power(&self, account: &AccountId) -> Amount {
        self.voting_power.get(account).copied().unwrap_or(0)
    }

    /// Point `delegator` at `to` (or clear its delegation when `to` is the
    /// zero account), moving `balance` of voting power. Returns the previous
    /// delegate.
    pub fn set_delegate(
        &mut self,
        delegator: &AccountId,
        to: &AccountId,
        balance: Amount,
    ) -> Option<AccountId> {
        let previous = if to.is_zero() {
            self.delegates.remove(delegator)
        } else {
            self.delegates.insert(*delegator, *to)
        };

        if let Some(prev) = previous {
            if let Some(set) = self.delegators.get_mut(&prev) {
                set.remove(delegator);
                if set.is_empty() {
                    self.delegators.remove(&prev);
                }
            }
        }
        if !to.is_zero() {
            self.delegators.entry(*to).or_default().insert(*delegator);
        }

        let target = if to.is_zero() { None } else { Some(*to) };
        self.move_power(previous.as_ref(), target.as_ref(), balance);
        previous
    }

    /// Re-attribute `amount` of voting power after a balance moved from
    /// `from` to `to`. `None` stands for minting (no source) or burning
    /// (no destination).
    pub fn on_balance_moved(
        &mut self,
        from: Option<&AccountId>,
        to: Option<&AccountId>,
        amount: Amount,
    ) {
        let from_delegate = from.and_then(|a| self.delegate_of(a));
        let to_delegate = to.and_then(|a| self.delegate_of(a));
        self.move_power(from_delegate.as_ref(), to_delegate.as_ref(), amount);
    }

    fn move_power(&mut self, from: Option<&AccountId>, to: Option<&AccountId>, amount: Amount) {
        if amount == 0 || from == to {
            return;
        }
        // Cached power never exceeds total supply, so neither side can wrap.
        if let Some(from) = from {
            let power = self.voting_power.entry(*from).or_insert(0);
            *power = power.saturating_sub(amount);
            if *power == 0 {
                self.voting_power.remove(from);
            }
            tracing::debug!("Voting power of {} decreased by {}", from.short(), amount);
        }
        if let Some(to) = to {
            let power = self.voting_power.entry(*to).or_insert(0);
            *power = power.saturating_add(amount);
            tracing::debug!("Voting power of {} increased by {}", to.short(), amount);
        }
    }
}
