// crates/syndicate-core/src/lib.rs
//
// syndicate-core: Core types, errors, and crypto primitives for the
// Syndicate token ledger and staking engine.
//
// This is the leaf crate that all other crates in the workspace depend on.

pub mod account;
pub mod amount;
pub mod block;
pub mod crypto;
pub mod error;
pub mod mask;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
pub use account::AccountId;
pub use amount::{parse_units, to_amount, units, Amount, Units, DECIMALS, UNITS_PER_TOKEN};
pub use block::BlockEnv;
pub use crypto::Keypair;
pub use error::{Gate, SyndicateError};
pub use mask::{Mask, EMPTY_MASK, FULL_MASK};
pub use traits::RoleOracle;

pub use primitive_types::U256;
