//! # Validator Assignment
//!
//! Per-epoch shuffle of staking validators into shards.
//!
//! Validators are drawn uniformly at random from the staking set and placed
//! round-robin (shard 1, 2, .., N, then 1 again). A validator that joined
//! this epoch is then swapped into the committee shard.

use crate::algorithms::shard_assignment::shard_count;
use crate::domain::ShardError;
use rand::Rng;
use shared_types::{
    short_hex, Address, GlobalState, Height, ShardId, ValidatorShardMapping, COMMITTEE_SHARD,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Compute the validator-shard mapping for the epoch starting at `epoch_height`.
pub fn assign_validators_to_shards<R: Rng + ?Sized>(
    state: &GlobalState,
    validators_per_shard: usize,
    newly_staking: Option<Address>,
    epoch_height: Height,
    rng: &mut R,
) -> Result<ValidatorShardMapping, ShardError> {
    // Address order, so a seeded rng reproduces the mapping.
    let mut pool: Vec<Address> = state
        .values()
        .filter(|account| account.is_staking)
        .map(|account| account.address)
        .collect();

    if pool.is_empty() {
        return Err(ShardError::NoValidators);
    }
    if let Some(newcomer) = newly_staking {
        if !pool.contains(&newcomer) {
            return Err(ShardError::UnknownValidator(newcomer));
        }
    }

    let num_shards = shard_count(pool.len(), validators_per_shard)?;
    let mut assignments: BTreeMap<Address, ShardId> = BTreeMap::new();

    'slots: for _ in 0..validators_per_shard {
        for shard in 1..=num_shards {
            if pool.is_empty() {
                break 'slots;
            }
            let index = rng.gen_range(0..pool.len());
            assignments.insert(pool.swap_remove(index), shard);
        }
    }

    if let Some(newcomer) = newly_staking {
        swap_into_committee(&mut assignments, newcomer);
    }

    debug!(
        epoch_height,
        num_shards,
        validators = assignments.len(),
        "[sc-02] Validators assigned to shards"
    );

    Ok(ValidatorShardMapping {
        epoch_height,
        assignments,
    })
}

fn swap_into_committee(assignments: &mut BTreeMap<Address, ShardId>, newcomer: Address) {
    let Some(drawn) = assignments.get(&newcomer).copied() else {
        return;
    };
    if drawn == COMMITTEE_SHARD {
        return;
    }
    let holder = assignments
        .iter()
        .find(|(_, shard)| **shard == COMMITTEE_SHARD)
        .map(|(address, _)| *address);
    if let Some(holder) = holder {
        debug!(
            newcomer = %short_hex(&newcomer),
            holder = %short_hex(&holder),
            drawn,
            "[sc-02] Swapping newly staking validator into committee"
        );
        assignments.insert(holder, drawn);
        assignments.insert(newcomer, COMMITTEE_SHARD);
    }
}
