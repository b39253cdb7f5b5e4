// crates/syndicate-core/src/error.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::Amount;

/// The authorization gate that rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    /// Transfer gate: transfers disabled and the receiver is not whitelisted.
    Receiver,
    /// Spend gate: on-behalf transfers disabled and the spender is not whitelisted.
    Spender,
    /// Delegation gate: the relevant delegation feature is disabled.
    Delegation,
    /// Caller lacks `TOKEN_CREATOR`.
    Mint,
    /// Caller lacks `TOKEN_DESTROYER`.
    Burn,
    /// Caller lacks `ACCESS_MANAGER`, or presented a stale capability.
    AccessManager,
    /// Caller is not the pool factory owner.
    FactoryOwner,
    /// Caller is not the swap escrow operator.
    SwapOperator,
    /// Swap destination is not a whitelisted escrow receiver.
    SwapReceiver,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Receiver => write!(f, "receiver"),
            Gate::Spender => write!(f, "spender"),
            Gate::Delegation => write!(f, "delegation"),
            Gate::Mint => write!(f, "mint"),
            Gate::Burn => write!(f, "burn"),
            Gate::AccessManager => write!(f, "access-manager"),
            Gate::FactoryOwner => write!(f, "factory-owner"),
            Gate::SwapOperator => write!(f, "swap-operator"),
            Gate::SwapReceiver => write!(f, "swap-receiver"),
        }
    }
}

/// Protocol-wide error types for the Syndicate ledger.
///
/// Every error leaves ledger state untouched; the caller has to change
/// something (obtain a role, wait for a lock to expire) before retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyndicateError {
    /// A role or feature gate rejected the operation.
    #[error("Unauthorized ({gate}): {reason}")]
    Unauthorized { gate: Gate, reason: String },

    /// Debit exceeds the account balance.
    #[error("Insufficient balance: requested {requested} but only {available} available")]
    InsufficientBalance { requested: Amount, available: Amount },

    /// Spend exceeds the approved allowance.
    #[error("Insufficient allowance: requested {requested} but only {available} approved")]
    InsufficientAllowance { requested: Amount, available: Amount },

    /// The stake is still locked.
    #[error("Stake locked until {locked_until} (now {now})")]
    StakeLocked { locked_until: u64, now: u64 },

    /// Zero amount where a positive one is required, or arithmetic overflow.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Malformed argument (bad lock interval, self transfer, expired signature).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown token, pool, or stake index.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid state transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Cryptographic error (malformed key or signature).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyndicateError {
    /// Shorthand for an `Unauthorized` error.
    pub fn unauthorized(gate: Gate, reason: impl Into<String>) -> Self {
        SyndicateError::Unauthorized {
            gate,
            reason: reason.into(),
        }
    }

    /// The gate that rejected the operation, if this is an authorization failure.
    pub fn gate(&self) -> Option<Gate> {
        match self {
            SyndicateError::Unauthorized { gate, .. } => Some(*gate),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SyndicateError {
    fn from(e: serde_json::Error) -> Self {
        SyndicateError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for SyndicateError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        SyndicateError::Crypto(e.to_string())
    }
}
