//! # Domain Invariants
//!
//! Rules every validator-shard mapping must satisfy.

use super::errors::ShardError;
use shared_types::{Address, ValidatorShardMapping, COMMITTEE_SHARD};

/// Invariant: the committee shard always has a validator.
pub fn invariant_committee_populated(mapping: &ValidatorShardMapping) -> Result<(), ShardError> {
    if mapping.validators_in(COMMITTEE_SHARD).is_empty() {
        return Err(ShardError::EmptyCommittee(COMMITTEE_SHARD));
    }
    Ok(())
}

/// Invariant: a validator that joined this epoch serves in the committee.
pub fn invariant_newcomer_in_committee(
    mapping: &ValidatorShardMapping,
    newly_staking: Option<&Address>,
) -> bool {
    newly_staking
        .map(|address| mapping.shard_of(address) == Some(COMMITTEE_SHARD))
        .unwrap_or(true)
}

/// Invariant: shard ids are contiguous from 1 to the shard count.
pub fn invariant_contiguous_shards(mapping: &ValidatorShardMapping) -> bool {
    (1..=mapping.shard_count()).all(|shard| !mapping.validators_in(shard).is_empty())
}
