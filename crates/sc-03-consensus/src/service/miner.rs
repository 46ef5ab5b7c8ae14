//! # Shard Miner
//!
//! Block assembly, finalization and self-validation for one height, and the
//! follower wait for a transaction assignment.

use super::validation::{previous_proofs, validate_block};
use super::NodeContext;
use crate::domain::{ChainState, ConsensusError, ConsensusResult};
use crate::metrics;
use crate::ports::StakeContext;
use sc_01_ledger::filter_applicable;
use sc_02_sharding::is_current_assignment;
use shared_bus::NodeEvent;
use shared_types::{
    commitment_message, short_hex, Block, NetworkMessage, Request, StateTransition,
    TransactionAssignment, TxBatch, COMMITTEE_SHARD,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Mine, self-validate and announce the block for `height`.
///
/// Transactions included in the block are removed from `pool`. On failure
/// nothing is announced and `chain` is untouched.
pub async fn mine_height(
    ctx: &NodeContext,
    chain: &mut ChainState,
    pool: &mut TxBatch,
    height: u64,
) -> ConsensusResult<Block> {
    let shard_id = chain
        .shard_id()
        .ok_or(ConsensusError::NotAValidator(ctx.address))?;
    let balance = chain
        .epoch_balance(&ctx.address)
        .ok_or(ConsensusError::NotAValidator(ctx.address))?;

    let outcome = filter_applicable(
        &chain.state,
        &ctx.address,
        pool,
        ctx.config.max_txs_per_block,
        &ctx.config.ledger,
    );
    if !outcome.rejected.is_empty() {
        debug!(
            height,
            shard_id,
            rejected = outcome.rejected.len(),
            "[sc-03] Skipping inapplicable transactions"
        );
    }

    let proof = ctx.signer.sign(&commitment_message(height));
    let prev_hash = chain.tip_hash();
    let mut candidate = Block::new(
        prev_hash,
        height,
        shard_id,
        ctx.address,
        proof,
        outcome.accepted,
    );
    candidate.timestamp = ctx.time.now();

    let stake = StakeContext {
        difficulty: ctx.config.difficulty,
        prev_proofs: previous_proofs(
            ctx.store.as_ref(),
            &prev_hash,
            ctx.config.num_included_prev_proofs,
        ),
        balance,
    };
    let block = ctx.finalizer.finalize(candidate, &stake).await?;

    let (after, relative) = validate_block(ctx, &chain.epoch_block, &chain.state, &block)
        .map_err(|e| {
            warn!(height, shard_id, error = %e, "[sc-03] Mined block failed self-validation");
            e
        })?;

    chain.state = after;
    ctx.store.replace_state(chain.state.clone());
    ctx.store.insert_block(block.clone());
    pool.remove_hashes(&block.transactions.hashes());
    chain.last_block = Some(block.clone());

    ctx.transport
        .broadcast(NetworkMessage::Block(block.clone()))
        .await?;

    if shard_id != COMMITTEE_SHARD {
        let transition = StateTransition {
            height,
            shard_id,
            commitment_proof: block.commitment_proof,
            relative_state: relative,
        };
        ctx.store.put_own_transition(transition.clone());
        ctx.store.insert_transition(transition.clone());
        ctx.transport
            .broadcast(NetworkMessage::StateTransition(transition))
            .await?;
    }

    ctx.events
        .publish(NodeEvent::BlockAccepted {
            height,
            shard_id,
            hash: block.hash,
            tx_count: block.transactions.len(),
        })
        .await;
    info!(
        height,
        shard_id,
        hash = %short_hex(&block.hash),
        txs = block.transactions.len(),
        "[sc-03] Block mined"
    );

    Ok(block)
}

/// Wait until the assignment for the current epoch and shard arrives.
///
/// Stale assignments are discarded. Every timeout re-announces the epoch
/// block and asks peers for the assignment directly.
pub async fn await_assignment(
    ctx: &NodeContext,
    chain: &ChainState,
    assignments: &mut mpsc::Receiver<TransactionAssignment>,
) -> ConsensusResult<TxBatch> {
    let epoch_height = chain.epoch_height();
    let shard_id = chain
        .shard_id()
        .ok_or(ConsensusError::NotAValidator(ctx.address))?;

    if let Some(stored) = ctx.store.assignment(epoch_height, shard_id) {
        return Ok(stored.transactions);
    }

    let timeout = ctx.config.assignment_request_timeout();
    loop {
        match tokio::time::timeout(timeout, assignments.recv()).await {
            Ok(Some(assignment)) if is_current_assignment(&assignment, epoch_height, shard_id) => {
                ctx.store.put_assignment(assignment.clone());
                return Ok(assignment.transactions);
            }
            Ok(Some(stale)) => {
                debug!(
                    height = stale.height,
                    shard_id = stale.shard_id,
                    epoch_height,
                    "[sc-03] Discarding assignment for another epoch or shard"
                );
            }
            Ok(None) => return Err(ConsensusError::ChannelClosed("assignment")),
            Err(_) => {
                metrics::record_request_timeout("assignment");
                debug!(epoch_height, shard_id, "[sc-03] Assignment wait timed out");
                ctx.transport
                    .broadcast(NetworkMessage::EpochBlock(chain.epoch_block.clone()))
                    .await?;
                let request = Request::assignment(epoch_height, shard_id);
                if let Some(NetworkMessage::Assignment(assignment)) =
                    ctx.transport.request(request, timeout).await?
                {
                    if is_current_assignment(&assignment, epoch_height, shard_id) {
                        ctx.store.put_assignment(assignment.clone());
                        return Ok(assignment.transactions);
                    }
                }
            }
        }
    }
}
