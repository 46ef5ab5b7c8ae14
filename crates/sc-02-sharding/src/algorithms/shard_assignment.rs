//! # Shard Assignment
//!
//! Shard count derivation and the sender-to-shard routing function.

use crate::domain::ShardError;
use shared_types::{keccak256, Address, ShardId};

/// Number of shards for `validators` staking accounts.
///
/// `ceil(validators / validators_per_shard)`, at least 1.
pub fn shard_count(validators: usize, validators_per_shard: usize) -> Result<ShardId, ShardError> {
    if validators_per_shard == 0 {
        return Err(ShardError::InvalidValidatorsPerShard(validators_per_shard));
    }
    let count = validators.div_ceil(validators_per_shard).max(1);
    ShardId::try_from(count).map_err(|_| ShardError::TooManyShards(count))
}

/// Shard responsible for funds and data transactions sent by `sender`.
///
/// `1 + (be_u16(keccak256(sender)[0..2]) mod shard_count)`.
pub fn shard_for_sender(sender: &Address, shard_count: ShardId) -> Result<ShardId, ShardError> {
    if shard_count == 0 {
        return Err(ShardError::ZeroShards);
    }
    let hash = keccak256(sender);
    let value = u16::from_be_bytes([hash[0], hash[1]]);
    Ok(1 + value % shard_count)
}
