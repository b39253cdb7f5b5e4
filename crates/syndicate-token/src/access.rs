// crates/syndicate-token/src/access.rs
//
// Role registry and feature mask for a gated token.
//
// Each account carries a 256-bit role mask; the token itself carries a
// feature mask. Only holders of ACCESS_MANAGER may change either, and only
// for the bits they hold themselves:
//
//   new = (target | (actor & desired)) & !(actor & !desired)
//
// so a full-privilege admin can set any mask, including resetting an account
// to zero in one call, while a partial admin cannot escalate.
//
// Mutations require an `AdminCap`, a single-use capability stamped with the
// registry version at issuance. Any change to the registry bumps the version,
// which invalidates every outstanding cap.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use syndicate_core::mask::{bit, contains, EMPTY_MASK, FULL_MASK};
use syndicate_core::{AccountId, Gate, Mask, RoleOracle, SyndicateError};

/// Plain transfers by the balance owner.
pub const FEATURE_TRANSFERS: Mask = bit(0);
/// Transfers by an approved spender.
pub const FEATURE_TRANSFERS_ON_BEHALF: Mask = bit(1);
/// Transfers to any receiver without whitelisting.
pub const FEATURE_UNSAFE_TRANSFERS: Mask = bit(2);
/// Self-service vote delegation.
pub const FEATURE_DELEGATIONS: Mask = bit(5);
/// Vote delegation through a signed authorization.
pub const FEATURE_DELEGATIONS_ON_BEHALF: Mask = bit(6);

/// May mint tokens.
pub const ROLE_TOKEN_CREATOR: Mask = bit(16);
/// May burn tokens from any account.
pub const ROLE_TOKEN_DESTROYER: Mask = bit(17);
/// May receive transfers while transfers are disabled.
pub const ROLE_WHITE_LISTED_RECEIVER: Mask = bit(18);
/// May spend on behalf of others while on-behalf transfers are disabled.
pub const ROLE_WHITE_LISTED_SPENDER: Mask = bit(19);
/// Protocol treasury.
pub const ROLE_TREASURY: Mask = bit(20);
/// Administrative super-role: may change roles and features.
pub const ROLE_ACCESS_MANAGER: Mask = bit(255);

/// Every bit set; granted to the deployer and super admin at genesis.
pub const FULL_PRIVILEGES: Mask = FULL_MASK;

/// Look up a role or feature constant by name ("TOKEN_CREATOR", "TRANSFERS").
pub fn named_mask(name: &str) -> Option<Mask> {
    let name = name.trim().to_ascii_uppercase();
    let name = name
        .strip_prefix("ROLE_")
        .or_else(|| name.strip_prefix("FEATURE_"))
        .unwrap_or(&name);
    match name {
        "TRANSFERS" => Some(FEATURE_TRANSFERS),
        "TRANSFERS_ON_BEHALF" => Some(FEATURE_TRANSFERS_ON_BEHALF),
        "UNSAFE_TRANSFERS" => Some(FEATURE_UNSAFE_TRANSFERS),
        "DELEGATIONS" => Some(FEATURE_DELEGATIONS),
        "DELEGATIONS_ON_BEHALF" => Some(FEATURE_DELEGATIONS_ON_BEHALF),
        "TOKEN_CREATOR" => Some(ROLE_TOKEN_CREATOR),
        "TOKEN_DESTROYER" => Some(ROLE_TOKEN_DESTROYER),
        "WHITE_LISTED_RECEIVER" => Some(ROLE_WHITE_LISTED_RECEIVER),
        "WHITE_LISTED_SPENDER" => Some(ROLE_WHITE_LISTED_SPENDER),
        "TREASURY" => Some(ROLE_TREASURY),
        "ACCESS_MANAGER" => Some(ROLE_ACCESS_MANAGER),
        "FULL_PRIVILEGES" => Some(FULL_PRIVILEGES),
        "NONE" => Some(EMPTY_MASK),
        _ => None,
    }
}

/// Combine a list of role/feature names into one mask.
pub fn parse_mask(names: &[String]) -> Result<Mask, SyndicateError> {
    names.iter().try_fold(EMPTY_MASK, |acc, name| {
        named_mask(name)
            .map(|m| acc | m)
            .ok_or_else(|| SyndicateError::InvalidArgument(format!("unknown role or feature '{}'", name)))
    })
}

/// Apply `desired` to `target` using only the bits `actor` holds.
pub fn evaluate_by(actor: Mask, target: Mask, desired: Mask) -> Mask {
    (target | (actor & desired)) & !(actor & !desired)
}

/// Single-use proof that `holder` held ACCESS_MANAGER at registry `version`.
#[derive(Debug)]
pub struct AdminCap {
    holder: AccountId,
    actor_mask: Mask,
    version: u64,
}

impl AdminCap {
    pub fn holder(&self) -> &AccountId {
        &self.holder
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Per-token role registry plus feature mask.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessControl {
    roles: HashMap<AccountId, Mask>,
    features: Mask,
    version: u64,
}

impl AccessControl {
    /// Registry where each of `admins` holds full privileges and no feature is enabled.
    pub fn new(admins: &[AccountId]) -> Self {
        let mut roles = HashMap::new();
        for admin in admins {
            roles.insert(*admin, FULL_PRIVILEGES);
        }
        Self {
            roles,
            features: EMPTY_MASK,
            version: 0,
        }
    }

    /// Monotonic counter bumped by every successful mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Issue a capability for `caller` if it holds ACCESS_MANAGER.
    pub fn admin_cap(&self, caller: &AccountId) -> Result<AdminCap, SyndicateError> {
        let actor_mask = self.user_roles(caller);
        if !contains(actor_mask, ROLE_ACCESS_MANAGER) {
            return Err(SyndicateError::unauthorized(
                Gate::AccessManager,
                format!("{} is not an access manager", caller.short()),
            ));
        }
        Ok(AdminCap {
            holder: *caller,
            actor_mask,
            version: self.version,
        })
    }

    fn check_cap(&self, cap: &AdminCap) -> Result<(), SyndicateError> {
        if cap.version != self.version {
            return Err(SyndicateError::unauthorized(
                Gate::AccessManager,
                format!(
                    "capability issued at version {} but registry is at {}",
                    cap.version, self.version
                ),
            ));
        }
        Ok(())
    }

    /// Set `account`'s role mask to `desired`, limited to the bits the cap
    /// holder owns. Returns the resulting mask.
    pub fn update_role(
        &mut self,
        cap: AdminCap,
        account: &AccountId,
        desired: Mask,
    ) -> Result<Mask, SyndicateError> {
        self.check_cap(&cap)?;
        let current = self.user_roles(account);
        let updated = evaluate_by(cap.actor_mask, current, desired);
        if updated.is_zero() {
            self.roles.remove(account);
        } else {
            self.roles.insert(*account, updated);
        }
        self.version += 1;
        tracing::info!(
            "Role update by {}: {} {:#x} -> {:#x}",
            cap.holder.short(),
            account.short(),
            current,
            updated
        );
        Ok(updated)
    }

    /// Set the feature mask to `desired`, limited to the bits the cap holder owns.
    pub fn update_features(&mut self, cap: AdminCap, desired: Mask) -> Result<Mask, SyndicateError> {
        self.check_cap(&cap)?;
        let updated = evaluate_by(cap.actor_mask, self.features, desired);
        tracing::info!(
            "Feature update by {}: {:#x} -> {:#x}",
            cap.holder.short(),
            self.features,
            updated
        );
        self.features = updated;
        self.version += 1;
        Ok(updated)
    }
}

impl RoleOracle for AccessControl {
    fn user_roles(&self, account: &AccountId) -> Mask {
        self.roles.get(account).copied().unwrap_or(EMPTY_MASK)
    }

    fn features(&self) -> Mask {
        self.features
    }
}
