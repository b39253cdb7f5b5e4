// crates/syndicate-core/src/traits.rs

use crate::account::AccountId;
use crate::mask::Mask;

/// Read-only authorization oracle over a role registry.
///
/// Implemented by the token access-control registry; the staking and swap
/// components consult it instead of reaching into token internals.
pub trait RoleOracle {
    /// Full role mask of `account`.
    fn user_roles(&self, account: &AccountId) -> Mask;

    /// Current feature mask.
    fn features(&self) -> Mask;

    /// True when `account` holds every bit of `role`.
    fn has_role(&self, account: &AccountId, role: Mask) -> bool {
        self.user_roles(account) & role == role
    }

    /// True when every bit of `feature` is enabled.
    fn is_feature_enabled(&self, feature: Mask) -> bool {
        self.features() & feature == feature
    }
}
