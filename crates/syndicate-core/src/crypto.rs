// crates/syndicate-core/src/crypto.rs

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::account::AccountId;
use crate::error::SyndicateError;

/// An ed25519 keypair whose public key doubles as an [`AccountId`].
pub struct Keypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// Rebuild a keypair from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// The account controlled by this keypair.
    pub fn account(&self) -> AccountId {
        AccountId::new(self.verifying_key.to_bytes())
    }

    /// Sign a message and return the signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }
}

/// Verify an ed25519 signature made by `signer` over `message`.
///
/// Returns `Ok(false)` for a well-formed signature that does not verify and
/// an error when the key or signature bytes are malformed.
pub fn verify_signature(
    signer: &AccountId,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, SyndicateError> {
    let verifying_key = VerifyingKey::from_bytes(signer.as_bytes())
        .map_err(|e| SyndicateError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| SyndicateError::Crypto("Signature must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Compute SHA-256 hash of the given bytes.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sign_verify() {
        let keypair = Keypair::generate();
        let message = b"delegate voting power";

        let signature = keypair.sign(message);
        let account = keypair.account();

        assert!(verify_signature(&account, message, &signature).unwrap());
        assert!(!verify_signature(&account, b"wrong message", &signature).unwrap());
    }

    #[test]
    fn test_from_seed_is_deterministic() {
        let a = Keypair::from_seed(&[7u8; 32]);
        let b = Keypair::from_seed(&[7u8; 32]);
        assert_eq!(a.account(), b.account());
    }

    #[test]
    fn test_verify_rejects_short_signature() {
        let keypair = Keypair::generate();
        assert!(verify_signature(&keypair.account(), b"msg", &[0u8; 10]).is_err());
    }

    #[test]
    fn test_hash_bytes() {
        let hash = hash_bytes(b"syndicate");
        assert_eq!(hash, hash_bytes(b"syndicate"));
        assert_ne!(hash, hash_bytes(b"different"));
    }
}
