// crates/syndicate-core/src/account.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::hash_bytes;
use crate::error::SyndicateError;

/// Identity of an account on the ledger.
///
/// Externally owned accounts use their ed25519 public key bytes, which lets
/// signed delegations be verified against the account itself. Program
/// accounts (pools, the factory, the swap escrow, tokens) use identifiers
/// derived from their parents with [`AccountId::derive`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; 32]);

impl AccountId {
    /// The all-zero account. Never holds a balance; used as "no delegate".
    pub const ZERO: AccountId = AccountId([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Deterministic account for a human label ("alice", "treasury").
    ///
    /// Used by the simulator and tests, where accounts do not sign anything.
    pub fn from_label(label: &str) -> Self {
        let mut data = b"syndicate:account:".to_vec();
        data.extend_from_slice(label.as_bytes());
        Self(hash_bytes(&data))
    }

    /// Derive a program account from a namespace and its parent accounts,
    /// e.g. a pool from (factory, asset).
    pub fn derive(namespace: &str, parents: &[&AccountId]) -> Self {
        let mut data = b"syndicate:derive:".to_vec();
        data.extend_from_slice(namespace.as_bytes());
        for parent in parents {
            data.extend_from_slice(parent.as_bytes());
        }
        Self(hash_bytes(&data))
    }

    /// Short form for logs: first four bytes in hex.
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short())
    }
}

impl FromStr for AccountId {
    type Err = SyndicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| SyndicateError::InvalidArgument(format!("bad account '{}': {}", s, e)))?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            SyndicateError::InvalidArgument(format!("account '{}' must be 32 bytes", s))
        })?;
        Ok(Self(array))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
