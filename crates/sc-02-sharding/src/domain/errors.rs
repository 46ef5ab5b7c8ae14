//! # Domain Errors
//!
//! Error types for the sharding subsystem.

use shared_types::{short_hex, Address, ShardId};
use thiserror::Error;

/// Sharding error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShardError {
    /// No staking validator exists in the state.
    #[error("No staking validators to assign")]
    NoValidators,

    /// `validators_per_shard` must be at least 1.
    #[error("Invalid validators per shard: {0}")]
    InvalidValidatorsPerShard(usize),

    /// Routing requires at least one shard.
    #[error("Shard count must be at least 1")]
    ZeroShards,

    /// Shard count does not fit a shard identifier.
    #[error("Too many shards: {0}")]
    TooManyShards(usize),

    /// Newly staking validator is not a staking account.
    #[error("Newly staking validator {} is not staking", short_hex(.0))]
    UnknownValidator(Address),

    /// A mapping left the committee shard empty.
    #[error("Committee shard {0} has no validator")]
    EmptyCommittee(ShardId),
}
