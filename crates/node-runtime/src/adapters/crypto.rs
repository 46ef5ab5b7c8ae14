//! # Ed25519 Commitment Scheme
//!
//! A node uses one Ed25519 key pair for both its account and its commitment
//! proofs: the account address is the Keccak-256 of the verifying key, and
//! the verifying key bytes are the commitment key stored on the account.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sc_03_consensus::{CommitmentCrypto, CommitmentSigner};
use shared_types::{address_from_pub_key, Address, CommitmentKey, CommitmentProof};

/// Verification half of the scheme.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Crypto;

impl CommitmentCrypto for Ed25519Crypto {
    fn verify(&self, key: &CommitmentKey, message: &[u8], proof: &CommitmentProof) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(key) else {
            return false;
        };
        let signature = Signature::from_bytes(proof);
        verifying_key.verify(message, &signature).is_ok()
    }

    fn derive_address(&self, public_key: &[u8]) -> Address {
        address_from_pub_key(public_key)
    }
}

/// A node's signing key.
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Account address owned by this key.
    pub fn address(&self) -> Address {
        address_from_pub_key(&self.commitment_key())
    }
}

impl CommitmentSigner for Ed25519Signer {
    fn commitment_key(&self) -> CommitmentKey {
        self.signing_key.verifying_key().to_bytes()
    }

    fn sign(&self, message: &[u8]) -> CommitmentProof {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("commitment_key", &hex::encode(self.commitment_key()))
            .finish_non_exhaustive()
    }
}
