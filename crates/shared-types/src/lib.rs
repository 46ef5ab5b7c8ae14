//! # Shared Types Crate
//!
//! Domain entities and wire messages shared by every Shard-Chain crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: accounts, transactions, shard blocks, epoch
//!   blocks and state transitions are defined once, here.
//! - **Closed transaction union**: [`Transaction`] is an enum over the four
//!   transaction kinds; every processing site matches it exhaustively.
//! - **Content addressing**: every hashable entity derives its identity from
//!   a Keccak-256 digest over its fields (see [`hashing`]).
//! - **Wire format**: all network messages go through [`codec`].

pub mod codec;
pub mod entities;
pub mod errors;
pub mod hashing;
pub mod messages;
pub mod transactions;

pub use codec::{decode, encode, MAX_MESSAGE_SIZE};
pub use entities::*;
pub use errors::*;
pub use hashing::{address_from_pub_key, keccak256, short_hex, ContentHasher};
pub use messages::*;
pub use transactions::*;

/// 32-byte account address (Keccak-256 of the account's public key).
pub type Address = [u8; 32];

/// 32-byte Keccak-256 digest.
pub type Hash = [u8; 32];

/// Shard identifier. Shards are numbered from 1; shard 1 is the committee.
pub type ShardId = u16;

/// Block or epoch height.
pub type Height = u64;

/// Account balance in the smallest unit.
pub type Balance = u64;

/// Commitment public-key material stored on a staking account.
pub type CommitmentKey = [u8; 32];

/// Commitment proof: a signature over the decimal string of a block height.
pub type CommitmentProof = [u8; 64];

/// The committee shard produces epoch blocks and routes transactions.
pub const COMMITTEE_SHARD: ShardId = 1;

/// Sentinel for accounts that never registered a commitment key.
pub const EMPTY_COMMITMENT_KEY: CommitmentKey = [0u8; 32];

/// Message signed by a commitment key to prove control at `height`.
pub fn commitment_message(height: Height) -> Vec<u8> {
    height.to_string().into_bytes()
}
