//! # Committee Round
//!
//! Run by the proposer of shard 1 at the end of every epoch: validate every
//! shard's blocks in height order, check each shard's claimed relative
//! states, and assemble the next epoch block.

use super::reconciliation::collect_transitions;
use super::validation::{charge_block, validate_block};
use super::NodeContext;
use crate::domain::{
    ChainState, ConsensusError, ConsensusResult, RoundError, RoundOutcome, SlashingProof,
};
use crate::metrics;
use rand::Rng;
use sc_01_ledger::{apply_relative_state, apply_stake_effects, diff_relative_states};
use sc_02_sharding::assign_validators_to_shards;
use shared_types::{
    short_hex, Block, EpochBlock, Height, NetworkMessage, RelativeState, Request, ShardId,
    SpendingBudget, StakeTx, COMMITTEE_SHARD,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Block for (`height`, `shard_id`) from the stash, or from peers.
///
/// Retries until it arrives; each unanswered request re-broadcasts the last
/// epoch block.
pub async fn fetch_block(
    ctx: &NodeContext,
    height: Height,
    shard_id: ShardId,
    epoch_block: &EpochBlock,
) -> ConsensusResult<Block> {
    let request = Request::block(height, shard_id);
    loop {
        if let Some(block) = ctx.store.block(height, shard_id) {
            return Ok(block);
        }
        let response = ctx
            .transport
            .request(request, ctx.config.block_request_timeout())
            .await?;
        if let Some(NetworkMessage::Block(block)) =
            response.filter(|message| request.is_answered_by(message))
        {
            if block.is_sealed() {
                ctx.store.insert_block(block.clone());
                return Ok(block);
            }
        }
        metrics::record_request_timeout("block");
        debug!(height, shard_id, "[sc-03] Block request unanswered");
        ctx.transport
            .broadcast(NetworkMessage::EpochBlock(epoch_block.clone()))
            .await?;
    }
}

/// Validate the closing epoch and build the next epoch block.
///
/// Any failing block check aborts with `ConsensusError::Round`, naming the
/// block to evict. Senders are charged against one budget across all
/// shards, so a sender debited in two shards cannot overdraw the merged
/// state. A contradicted transition yields
/// [`RoundOutcome::CheatDetected`] and no epoch block.
pub async fn run_committee_round<R: Rng + Send>(
    ctx: &NodeContext,
    chain: &ChainState,
    rng: &mut R,
) -> ConsensusResult<RoundOutcome> {
    let epoch_block = &chain.epoch_block;
    let epoch_height = epoch_block.height;
    let heights = chain.epoch_heights(ctx.config.epoch_length);
    let last_height = *heights.end();
    let num_shards = chain.num_shards;

    info!(epoch_height, num_shards, "[sc-03] Committee round started");

    // Transitions of every non-committee shard, fetched alongside the blocks.
    let wanted: Vec<(Height, ShardId)> = heights
        .clone()
        .flat_map(|height| (COMMITTEE_SHARD + 1..=num_shards).map(move |shard| (height, shard)))
        .collect();
    let collector = tokio::spawn(collect_transitions(
        ctx.clone(),
        chain.mapping.clone(),
        epoch_block.clone(),
        wanted,
    ));

    let epoch_state = &epoch_block.state;
    let mut working = epoch_state.clone();
    let mut budget = SpendingBudget::new(epoch_state);
    let mut computed: BTreeMap<(Height, ShardId), RelativeState> = BTreeMap::new();
    let mut committee_stakes: Vec<StakeTx> = Vec::new();
    let mut tips = Vec::with_capacity(usize::from(num_shards));

    let validated = async {
        for height in heights.clone() {
            let mut height_effects = Vec::with_capacity(usize::from(num_shards));
            for shard_id in 1..=num_shards {
                let block = fetch_block(ctx, height, shard_id, epoch_block).await?;
                let (_, relative) = validate_block(ctx, epoch_block, &working, &block)?;
                charge_block(&mut budget, &block)?;

                ctx.store.close_transactions(&block.transactions.hashes());
                if shard_id == COMMITTEE_SHARD {
                    committee_stakes.extend(block.transactions.stake.iter().cloned());
                }
                if height == last_height {
                    tips.push(block.hash);
                }
                metrics::record_block_validated();
                debug!(height, shard_id, "[sc-03] Block validated by committee");

                computed.insert((height, shard_id), relative.clone());
                height_effects.push(relative);
            }
            for relative in &height_effects {
                working = apply_relative_state(
                    std::mem::take(&mut working),
                    relative,
                    &ctx.config.ledger,
                )
                .map_err(|source| RoundError::RelativeState {
                    height,
                    shard_id: relative.shard_id,
                    source,
                })?;
            }
        }
        Ok::<(), ConsensusError>(())
    }
    .await;

    if let Err(e) = validated {
        collector.abort();
        return Err(e);
    }

    let transitions = collector
        .await
        .map_err(|e| ConsensusError::TaskJoin(e.to_string()))??;

    let mut proofs = Vec::new();
    for ((height, shard_id), transition) in &transitions {
        let Some(expected) = computed.get(&(*height, *shard_id)) else {
            continue;
        };
        let mismatches = diff_relative_states(expected, &transition.relative_state);
        if !mismatches.is_empty() {
            warn!(
                height,
                shard_id,
                accounts = mismatches.len(),
                "[sc-03] Shard claimed a relative state the committee cannot reproduce"
            );
            proofs.push(SlashingProof {
                height: *height,
                shard_id: *shard_id,
                proposer: chain.mapping.proposer(*shard_id),
                transition_hash: transition.hash(),
                mismatches,
            });
        }
    }
    if !proofs.is_empty() {
        return Ok(RoundOutcome::CheatDetected(proofs));
    }

    let mut next_state = working;
    let newly_staking =
        apply_stake_effects(&mut next_state, &committee_stakes, &ctx.config.ledger)?;
    let newcomer = newly_staking.first().copied();
    let next_height = last_height + 1;
    let mapping = assign_validators_to_shards(
        &next_state,
        ctx.config.validators_per_shard,
        newcomer,
        next_height,
        rng,
    )?;

    let next = EpochBlock {
        hash: [0u8; 32],
        height: next_height,
        prev_shard_hashes: tips,
        state: next_state,
        num_shards: mapping.shard_count(),
        mapping,
        beneficiary: ctx.address,
        timestamp: ctx.time.now(),
    }
    .seal();

    info!(
        height = next.height,
        num_shards = next.num_shards,
        hash = %short_hex(&next.hash),
        newcomer = %newcomer.map(|a| short_hex(&a)).unwrap_or_default(),
        "[sc-03] Epoch block assembled"
    );
    Ok(RoundOutcome::Closed(next))
}
