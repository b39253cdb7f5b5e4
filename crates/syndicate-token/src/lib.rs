// crates/syndicate-token/src/lib.rs
//
// syndicate-token: role-gated fungible token ledger with a feature mask,
// per-account role registry, and single-hop vote delegation. Backs both the
// primary token and the escrowed reward token.

pub mod access;
pub mod delegation;
pub mod token;

// Re-export key types for ergonomic access from downstream crates.
pub use access::{
    evaluate_by, named_mask, parse_mask, AccessControl, AdminCap, FEATURE_DELEGATIONS,
    FEATURE_DELEGATIONS_ON_BEHALF, FEATURE_TRANSFERS, FEATURE_TRANSFERS_ON_BEHALF,
    FEATURE_UNSAFE_TRANSFERS, FULL_PRIVILEGES, ROLE_ACCESS_MANAGER, ROLE_TOKEN_CREATOR,
    ROLE_TOKEN_DESTROYER, ROLE_TREASURY, ROLE_WHITE_LISTED_RECEIVER, ROLE_WHITE_LISTED_SPENDER,
};
pub use delegation::DelegationIndex;
pub use token::{delegation_message, GatedToken, SignedDelegation};
