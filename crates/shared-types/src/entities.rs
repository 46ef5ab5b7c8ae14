//! # Core Domain Entities
//!
//! Accounts, shard blocks, epoch blocks, state transitions and the
//! validator-to-shard mapping.

use crate::hashing::ContentHasher;
use crate::transactions::TxBatch;
use crate::{
    Address, Balance, CommitmentKey, CommitmentProof, Hash, Height, ShardId, EMPTY_COMMITMENT_KEY,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::collections::BTreeMap;

/// Mapping address to account; one live instance per node.
pub type GlobalState = BTreeMap<Address, Account>;

// =============================================================================
// ACCOUNT
// =============================================================================

/// A ledger account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub balance: Balance,
    pub is_staking: bool,
    /// Commitment public key; [`EMPTY_COMMITMENT_KEY`] until the account stakes.
    pub commitment_key: CommitmentKey,
}

impl Account {
    /// A fresh, non-staking account.
    pub fn new(address: Address, balance: Balance) -> Self {
        Self {
            address,
            balance,
            is_staking: false,
            commitment_key: EMPTY_COMMITMENT_KEY,
        }
    }

    /// A staking account with a registered commitment key.
    pub fn validator(address: Address, balance: Balance, commitment_key: CommitmentKey) -> Self {
        Self {
            address,
            balance,
            is_staking: true,
            commitment_key,
        }
    }

    fn feed(&self, hasher: ContentHasher) -> ContentHasher {
        hasher
            .fixed(&self.address)
            .u64(self.balance)
            .flag(self.is_staking)
            .fixed(&self.commitment_key)
    }
}

// =============================================================================
// SHARD BLOCK
// =============================================================================

/// A block mined by one shard at one height.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Content hash over every other field.
    pub hash: Hash,
    pub prev_hash: Hash,
    pub height: Height,
    pub shard_id: ShardId,
    pub beneficiary: Address,
    #[serde_as(as = "Bytes")]
    pub commitment_proof: CommitmentProof,
    pub timestamp: u64,
    pub transactions: TxBatch,
}

impl Block {
    /// Unsealed block; call [`Block::seal`] once the timestamp is final.
    pub fn new(
        prev_hash: Hash,
        height: Height,
        shard_id: ShardId,
        beneficiary: Address,
        commitment_proof: CommitmentProof,
        transactions: TxBatch,
    ) -> Self {
        Self {
            hash: [0u8; 32],
            prev_hash,
            height,
            shard_id,
            beneficiary,
            commitment_proof,
            timestamp: 0,
            transactions,
        }
    }

    pub fn compute_hash(&self) -> Hash {
        let mut hasher = ContentHasher::new(b"shard-block")
            .fixed(&self.prev_hash)
            .u64(self.height)
            .u16(self.shard_id)
            .fixed(&self.beneficiary)
            .fixed(&self.commitment_proof)
            .u64(self.timestamp)
            .u64(self.transactions.len() as u64);
        for tx_hash in self.transactions.hashes() {
            hasher = hasher.fixed(&tx_hash);
        }
        hasher.finish()
    }

    /// Fix the content hash.
    pub fn seal(mut self) -> Self {
        self.hash = self.compute_hash();
        self
    }

    pub fn is_sealed(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

// =============================================================================
// RELATIVE STATE / STATE TRANSITION
// =============================================================================

/// Balance effect of one shard's block.
///
/// `apply(before, relative) == after` holds for every touched account:
/// pre-existing accounts carry a signed delta, accounts the block created
/// are carried whole.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeState {
    pub shard_id: ShardId,
    pub deltas: BTreeMap<Address, i64>,
    pub created: BTreeMap<Address, Account>,
}

impl RelativeState {
    pub fn new(shard_id: ShardId) -> Self {
        Self {
            shard_id,
            ..Self::default()
        }
    }

    /// Delta for `address`; untouched accounts read as zero.
    pub fn delta(&self, address: &Address) -> i64 {
        self.deltas.get(address).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty() && self.created.is_empty()
    }

    fn feed(&self, mut hasher: ContentHasher) -> ContentHasher {
        hasher = hasher.u16(self.shard_id).u64(self.deltas.len() as u64);
        for (address, delta) in &self.deltas {
            hasher = hasher.fixed(address).i64(*delta);
        }
        hasher = hasher.u64(self.created.len() as u64);
        for account in self.created.values() {
            hasher = account.feed(hasher);
        }
        hasher
    }
}

/// A shard's signed claim of the balance effects its block produced.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub height: Height,
    pub shard_id: ShardId,
    #[serde_as(as = "Bytes")]
    pub commitment_proof: CommitmentProof,
    pub relative_state: RelativeState,
}

impl StateTransition {
    pub fn hash(&self) -> Hash {
        let hasher = ContentHasher::new(b"state-transition")
            .u64(self.height)
            .u16(self.shard_id)
            .fixed(&self.commitment_proof);
        self.relative_state.feed(hasher).finish()
    }
}

// =============================================================================
// TRANSACTION ASSIGNMENT
// =============================================================================

/// Transactions a shard must process during one epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAssignment {
    /// Epoch height the assignment was issued at.
    pub height: Height,
    pub shard_id: ShardId,
    pub transactions: TxBatch,
}

impl TransactionAssignment {
    pub fn is_for(&self, height: Height, shard_id: ShardId) -> bool {
        self.height == height && self.shard_id == shard_id
    }
}

// =============================================================================
// VALIDATOR-SHARD MAPPING
// =============================================================================

/// Which shard each validator serves for one epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorShardMapping {
    pub epoch_height: Height,
    pub assignments: BTreeMap<Address, ShardId>,
}

impl ValidatorShardMapping {
    pub fn shard_of(&self, validator: &Address) -> Option<ShardId> {
        self.assignments.get(validator).copied()
    }

    /// Validators of `shard_id` in address order.
    pub fn validators_in(&self, shard_id: ShardId) -> Vec<Address> {
        self.assignments
            .iter()
            .filter(|(_, shard)| **shard == shard_id)
            .map(|(address, _)| *address)
            .collect()
    }

    /// The validator that mines for `shard_id`: the lowest address in the shard.
    pub fn proposer(&self, shard_id: ShardId) -> Option<Address> {
        self.assignments
            .iter()
            .find(|(_, shard)| **shard == shard_id)
            .map(|(address, _)| *address)
    }

    /// Highest shard id in use.
    pub fn shard_count(&self) -> ShardId {
        self.assignments.values().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    fn feed(&self, mut hasher: ContentHasher) -> ContentHasher {
        hasher = hasher
            .u64(self.epoch_height)
            .u64(self.assignments.len() as u64);
        for (address, shard) in &self.assignments {
            hasher = hasher.fixed(address).u16(*shard);
        }
        hasher
    }
}

// =============================================================================
// EPOCH BLOCK
// =============================================================================

/// Checkpoint closing one epoch and seeding the next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochBlock {
    pub hash: Hash,
    pub height: Height,
    /// Hash of every shard's last block of the closed epoch, by shard id.
    pub prev_shard_hashes: Vec<Hash>,
    pub state: GlobalState,
    pub mapping: ValidatorShardMapping,
    pub num_shards: ShardId,
    pub beneficiary: Address,
    pub timestamp: u64,
}

impl EpochBlock {
    pub fn compute_hash(&self) -> Hash {
        let mut hasher = ContentHasher::new(b"epoch-block")
            .u64(self.height)
            .u64(self.prev_shard_hashes.len() as u64);
        for prev in &self.prev_shard_hashes {
            hasher = hasher.fixed(prev);
        }
        hasher = hasher.u64(self.state.len() as u64);
        for account in self.state.values() {
            hasher = account.feed(hasher);
        }
        self.mapping
            .feed(hasher)
            .u16(self.num_shards)
            .fixed(&self.beneficiary)
            .u64(self.timestamp)
            .finish()
    }

    pub fn seal(mut self) -> Self {
        self.hash = self.compute_hash();
        self
    }

    pub fn is_sealed(&self) -> bool {
        self.hash == self.compute_hash()
    }
}
