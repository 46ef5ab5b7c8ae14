//! # Reconciliation
//!
//! Non-committee shards never see each other's transactions. While mining
//! an epoch each of them fetches its peers' signed state transitions, and
//! merges the relative states into its live state once its own blocks are
//! done. The committee uses the
//! same collection step to gather every transition it must check.

use super::validation::verify_transition;
use super::NodeContext;
use crate::domain::{ChainState, ConsensusError, ConsensusResult};
use crate::metrics;
use sc_01_ledger::apply_relative_state;
use shared_types::{
    CommitmentKey, EpochBlock, Height, NetworkMessage, Request, ShardId, StateTransition,
    ValidatorShardMapping, COMMITTEE_SHARD,
};
use std::collections::{BTreeMap, VecDeque};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Shards whose transitions `shard_id` must merge: everyone but itself and
/// the committee, which emits none.
pub fn reconciliation_peers(num_shards: ShardId, shard_id: ShardId) -> Vec<ShardId> {
    (1..=num_shards)
        .filter(|peer| *peer != shard_id && *peer != COMMITTEE_SHARD)
        .collect()
}

fn proposer_key(
    mapping: &ValidatorShardMapping,
    epoch_block: &EpochBlock,
    shard_id: ShardId,
) -> Option<CommitmentKey> {
    let proposer = mapping.proposer(shard_id)?;
    epoch_block
        .state
        .get(&proposer)
        .map(|account| account.commitment_key)
}

/// Collect a verified transition for every (height, shard) in `wanted`.
///
/// Stashed transitions are used first; missing ones are requested in turn,
/// so one slow shard does not hold up the others. A transition counts only
/// if its commitment proof verifies under the key of the shard's proposer.
pub async fn collect_transitions(
    ctx: NodeContext,
    mapping: ValidatorShardMapping,
    epoch_block: EpochBlock,
    wanted: Vec<(Height, ShardId)>,
) -> ConsensusResult<BTreeMap<(Height, ShardId), StateTransition>> {
    let timeout = ctx.config.transition_request_timeout();
    let mut collected = BTreeMap::new();
    let mut pending: VecDeque<(Height, ShardId)> = wanted.into();

    while let Some((height, shard_id)) = pending.pop_front() {
        let Some(key) = proposer_key(&mapping, &epoch_block, shard_id) else {
            warn!(height, shard_id, "[sc-03] No proposer key for shard, skipping transition");
            continue;
        };

        if let Some(stashed) = ctx.store.transition(height, shard_id) {
            if verify_transition(&ctx, &key, &stashed) {
                collected.insert((height, shard_id), stashed);
                continue;
            }
            warn!(height, shard_id, "[sc-03] Evicting transition with invalid proof");
            ctx.store.remove_transition(height, shard_id);
        }

        let request = Request::state_transition(height, shard_id);
        let response = ctx.transport.request(request, timeout).await?;
        match response.filter(|message| request.is_answered_by(message)) {
            Some(NetworkMessage::StateTransition(transition))
                if verify_transition(&ctx, &key, &transition) =>
            {
                ctx.store.insert_transition(transition.clone());
                collected.insert((height, shard_id), transition);
            }
            _ => {
                metrics::record_request_timeout("state_transition");
                debug!(height, shard_id, "[sc-03] Transition request unanswered");
                pending.push_back((height, shard_id));
            }
        }
    }

    Ok(collected)
}

/// Peer transitions being collected in the background while the node mines.
pub struct PendingReconciliation {
    shard_id: ShardId,
    collector: JoinHandle<ConsensusResult<BTreeMap<(Height, ShardId), StateTransition>>>,
}

impl PendingReconciliation {
    /// Stop collecting; nothing is merged.
    pub fn abort(&self) {
        self.collector.abort();
    }

    /// Wait for the collection to finish and merge it into live state.
    ///
    /// Returns the number of transitions merged.
    pub async fn merge_into(
        self,
        ctx: &NodeContext,
        chain: &mut ChainState,
    ) -> ConsensusResult<usize> {
        let collected = self
            .collector
            .await
            .map_err(|e| ConsensusError::TaskJoin(e.to_string()))??;

        let mut merged = 0;
        for ((height, peer), transition) in &collected {
            match apply_relative_state(
                chain.state.clone(),
                &transition.relative_state,
                &ctx.config.ledger,
            ) {
                Ok(next) => {
                    chain.state = next;
                    merged += 1;
                }
                Err(e) => {
                    warn!(
                        height,
                        shard_id = peer,
                        error = %e,
                        "[sc-03] Peer transition does not apply"
                    );
                }
            }
        }
        ctx.store.replace_state(chain.state.clone());

        info!(shard_id = self.shard_id, merged, "[sc-03] Reconciliation complete");
        Ok(merged)
    }
}

/// Start collecting every peer shard's transitions of the current epoch.
///
/// Requests go out right away, while the node is still mining. Returns
/// `None`, issuing no request at all, when the node has no peers.
pub fn start_reconciliation(
    ctx: &NodeContext,
    chain: &ChainState,
) -> Option<PendingReconciliation> {
    let shard_id = chain.shard_id()?;
    let peers = reconciliation_peers(chain.num_shards, shard_id);
    if peers.is_empty() {
        debug!(shard_id, "[sc-03] No peer shards to reconcile with");
        return None;
    }

    let wanted: Vec<(Height, ShardId)> = chain
        .epoch_heights(ctx.config.epoch_length)
        .flat_map(|height| peers.iter().map(move |peer| (height, *peer)))
        .collect();
    let collector = tokio::spawn(collect_transitions(
        ctx.clone(),
        chain.mapping.clone(),
        chain.epoch_block.clone(),
        wanted,
    ));
    Some(PendingReconciliation {
        shard_id,
        collector,
    })
}

/// Collect and merge every peer shard's transitions of the closing epoch.
pub async fn reconcile(ctx: &NodeContext, chain: &mut ChainState) -> ConsensusResult<usize> {
    match start_reconciliation(ctx, chain) {
        Some(pending) => pending.merge_into(ctx, chain).await,
        None => Ok(0),
    }
}
