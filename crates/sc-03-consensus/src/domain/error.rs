//! Error types for the consensus subsystem.

use sc_01_ledger::{BatchError, LedgerError};
use sc_02_sharding::ShardError;
use shared_types::{short_hex, Address, CodecError, Height, ShardId};

/// Storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Epoch block at height {0} is not sealed")]
    UnsealedEpochBlock(Height),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Transport failures. A request timing out is not one of them.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Peer unreachable: {0}")]
    Unreachable(String),
}

/// Why a committee round was abandoned.
///
/// Every variant names the block that caused it so the engine can evict it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("Block {height}/{shard_id}: only {num_shards} shards this epoch")]
    ShardOutOfRange {
        height: Height,
        shard_id: ShardId,
        num_shards: ShardId,
    },

    #[error("Block {height}/{shard_id}: unknown beneficiary {}", short_hex(.beneficiary))]
    UnknownBeneficiary {
        height: Height,
        shard_id: ShardId,
        beneficiary: Address,
    },

    #[error("Block {height}/{shard_id}: beneficiary {} is not staking", short_hex(.beneficiary))]
    NotStaking {
        height: Height,
        shard_id: ShardId,
        beneficiary: Address,
    },

    #[error("Block {height}/{shard_id}: {} is not the shard proposer", short_hex(.beneficiary))]
    NotShardProposer {
        height: Height,
        shard_id: ShardId,
        beneficiary: Address,
    },

    #[error("Block {height}/{shard_id}: commitment proof does not verify")]
    CommitmentProof { height: Height, shard_id: ShardId },

    #[error("Block {height}/{shard_id}: stake proof rejected")]
    StakeProof { height: Height, shard_id: ShardId },

    #[error("Block {height}/{shard_id}: {source}")]
    InvalidBlock {
        height: Height,
        shard_id: ShardId,
        source: BatchError,
    },

    #[error("Block {height}/{shard_id}: {} spends more than its epoch balance", short_hex(.sender))]
    Overdraft {
        height: Height,
        shard_id: ShardId,
        sender: Address,
    },

    #[error("Block {height}/{shard_id}: relative state rejected: {source}")]
    RelativeState {
        height: Height,
        shard_id: ShardId,
        source: LedgerError,
    },
}

impl RoundError {
    /// Height of the offending block.
    pub fn height(&self) -> Height {
        match self {
            Self::ShardOutOfRange { height, .. }
            | Self::UnknownBeneficiary { height, .. }
            | Self::NotStaking { height, .. }
            | Self::NotShardProposer { height, .. }
            | Self::CommitmentProof { height, .. }
            | Self::StakeProof { height, .. }
            | Self::InvalidBlock { height, .. }
            | Self::Overdraft { height, .. }
            | Self::RelativeState { height, .. } => *height,
        }
    }

    /// Shard of the offending block.
    pub fn shard_id(&self) -> ShardId {
        match self {
            Self::ShardOutOfRange { shard_id, .. }
            | Self::UnknownBeneficiary { shard_id, .. }
            | Self::NotStaking { shard_id, .. }
            | Self::NotShardProposer { shard_id, .. }
            | Self::CommitmentProof { shard_id, .. }
            | Self::StakeProof { shard_id, .. }
            | Self::InvalidBlock { shard_id, .. }
            | Self::Overdraft { shard_id, .. }
            | Self::RelativeState { shard_id, .. } => *shard_id,
        }
    }

    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ShardOutOfRange { .. } => "shard_out_of_range",
            Self::UnknownBeneficiary { .. } => "unknown_beneficiary",
            Self::NotStaking { .. } => "not_staking",
            Self::NotShardProposer { .. } => "not_shard_proposer",
            Self::CommitmentProof { .. } => "commitment_proof",
            Self::StakeProof { .. } => "stake_proof",
            Self::InvalidBlock { .. } => "invalid_block",
            Self::Overdraft { .. } => "overdraft",
            Self::RelativeState { .. } => "relative_state",
        }
    }
}

/// Why a received epoch block was not adopted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EpochBlockError {
    #[error("Epoch block is not sealed")]
    Unsealed,

    #[error("Epoch block carries no validator mapping")]
    EmptyMapping,

    #[error("Expected epoch block at height {expected}, got {found}")]
    WrongHeight { expected: Height, found: Height },

    #[error("Epoch block beneficiary {} is not the committee", short_hex(.beneficiary))]
    NotCommittee { beneficiary: Address },

    #[error("Epoch block has {found} shard tips, expected {expected}")]
    ShardTips { expected: ShardId, found: usize },

    #[error("Epoch block does not link to the last block of shard {shard_id}")]
    BrokenLink { shard_id: ShardId },
}

/// Consensus error types
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Round aborted: {0}")]
    Round(#[from] RoundError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Batch rejected: {0}")]
    Batch(#[from] BatchError),

    #[error("Sharding error: {0}")]
    Shard(#[from] ShardError),

    #[error("Node {} has no account in the epoch state", short_hex(.0))]
    NotAValidator(Address),

    #[error("Finalizer found no valid proof for height {0}")]
    Finalizer(Height),

    #[error("Inbound {0} channel closed")]
    ChannelClosed(&'static str),

    #[error("Background task failed: {0}")]
    TaskJoin(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
