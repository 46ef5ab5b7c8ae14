//! Driven ports (outbound dependencies)
//!
//! Storage, transport, cryptography and the stake search are all external
//! collaborators; the engine only sees these traits.

use crate::domain::{ConsensusResult, StoreError, TransportError};
use async_trait::async_trait;
use shared_types::{
    Account, Address, Block, CommitmentKey, CommitmentProof, EpochBlock, GlobalState, Hash,
    Height, NetworkMessage, Request, ShardId, StateTransition, Transaction,
    TransactionAssignment,
};
use std::time::Duration;

/// Node-local storage.
///
/// Every collection synchronises on its own; callers never hold a lock.
pub trait Store: Send + Sync {
    // --- accounts and state ---
    fn account(&self, address: &Address) -> Option<Account>;
    fn put_account(&self, account: Account);
    /// Snapshot of the full state.
    fn state(&self) -> GlobalState;
    /// Replace the full state atomically.
    fn replace_state(&self, state: GlobalState);

    // --- transaction pools ---
    fn add_open_transactions(&self, txs: Vec<Transaction>);
    fn open_transactions(&self) -> Vec<Transaction>;
    /// Move the matching open transactions to the closed pool.
    fn close_transactions(&self, hashes: &[Hash]);
    fn is_closed(&self, hash: &Hash) -> bool;

    // --- block stash ---
    /// Returns false if a block for the same (height, shard) is already stashed.
    fn insert_block(&self, block: Block) -> bool;
    fn block(&self, height: Height, shard_id: ShardId) -> Option<Block>;
    fn block_by_hash(&self, hash: &Hash) -> Option<Block>;
    fn remove_block(&self, height: Height, shard_id: ShardId) -> Option<Block>;

    // --- transition stash ---
    /// Returns false if a transition for the same (height, shard) is already stashed.
    fn insert_transition(&self, transition: StateTransition) -> bool;
    fn transition(&self, height: Height, shard_id: ShardId) -> Option<StateTransition>;
    fn remove_transition(&self, height: Height, shard_id: ShardId) -> Option<StateTransition>;
    /// Transitions this node signed itself.
    fn put_own_transition(&self, transition: StateTransition);
    fn own_transition(&self, height: Height) -> Option<StateTransition>;

    // --- assignments ---
    fn put_assignment(&self, assignment: TransactionAssignment);
    fn assignment(&self, height: Height, shard_id: ShardId) -> Option<TransactionAssignment>;

    // --- epoch blocks ---
    /// Persist a closed epoch block and make it the last one.
    fn write_epoch_block(&self, epoch_block: EpochBlock) -> Result<(), StoreError>;
    fn epoch_block(&self, height: Height) -> Option<EpochBlock>;
    fn last_epoch_block(&self) -> Option<EpochBlock>;
}

/// Message delivery to the other nodes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn broadcast(&self, message: NetworkMessage) -> Result<(), TransportError>;

    /// Ask peers for one item. `Ok(None)` means nobody answered in time.
    async fn request(
        &self,
        request: Request,
        timeout: Duration,
    ) -> Result<Option<NetworkMessage>, TransportError>;
}

/// Verification side of the commitment-proof scheme.
pub trait CommitmentCrypto: Send + Sync {
    fn verify(&self, key: &CommitmentKey, message: &[u8], proof: &CommitmentProof) -> bool;

    fn derive_address(&self, public_key: &[u8]) -> Address;
}

/// This node's commitment private key.
pub trait CommitmentSigner: Send + Sync {
    fn commitment_key(&self) -> CommitmentKey;

    fn sign(&self, message: &[u8]) -> CommitmentProof;
}

/// Inputs of the proof-of-stake acceptance predicate.
#[derive(Clone, Copy, Debug)]
pub struct StakeProofInput<'a> {
    pub difficulty: u32,
    /// Most recent first.
    pub prev_proofs: &'a [CommitmentProof],
    pub height: Height,
    pub balance: u64,
    pub commitment_proof: &'a CommitmentProof,
    pub timestamp: u64,
}

/// Pluggable proof-of-stake acceptance predicate.
pub trait ProofOfStake: Send + Sync {
    fn validate(&self, input: &StakeProofInput<'_>) -> bool;
}

/// Everything the finalizer needs besides the block.
#[derive(Clone, Debug)]
pub struct StakeContext {
    pub difficulty: u32,
    pub prev_proofs: Vec<CommitmentProof>,
    pub balance: u64,
}

/// Searches a timestamp that satisfies the stake predicate and seals the block.
#[async_trait]
pub trait BlockFinalizer: Send + Sync {
    async fn finalize(&self, block: Block, context: &StakeContext) -> ConsensusResult<Block>;
}

/// Time source for block and epoch-block timestamps.
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in seconds
    fn now(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
