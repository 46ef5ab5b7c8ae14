//! # Content Hashing
//!
//! Keccak-256 helpers. Entities hash their fields through [`ContentHasher`]
//! so identities never depend on serializer layout.

use crate::{Address, Hash};
use sha3::{Digest, Keccak256};

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Address owned by a public key.
pub fn address_from_pub_key(pub_key: &[u8]) -> Address {
    keccak256(pub_key)
}

/// First four bytes as hex, for log lines.
pub fn short_hex(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}

/// Incremental field hasher.
///
/// Every variable-length field is length-prefixed so adjacent fields cannot
/// alias each other.
pub struct ContentHasher {
    inner: Keccak256,
}

impl ContentHasher {
    /// Start a digest under a domain tag.
    pub fn new(domain: &[u8]) -> Self {
        let mut inner = Keccak256::new();
        inner.update((domain.len() as u64).to_be_bytes());
        inner.update(domain);
        Self { inner }
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.inner.update(value.to_be_bytes());
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.inner.update(value.to_be_bytes());
        self
    }

    pub fn i64(mut self, value: i64) -> Self {
        self.inner.update(value.to_be_bytes());
        self
    }

    pub fn flag(mut self, value: bool) -> Self {
        self.inner.update([u8::from(value)]);
        self
    }

    /// Fixed-size field.
    pub fn fixed(mut self, bytes: &[u8]) -> Self {
        self.inner.update(bytes);
        self
    }

    /// Variable-length field.
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.inner.update((bytes.len() as u64).to_be_bytes());
        self.inner.update(bytes);
        self
    }

    pub fn finish(self) -> Hash {
        self.inner.finalize().into()
    }
}
