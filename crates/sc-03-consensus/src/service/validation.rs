//! Block, transition and epoch block checks shared by the miner, the
//! committee and every node waiting for the next epoch.

use super::NodeContext;
use crate::domain::{ChainState, EpochBlockError, RoundError};
use crate::ports::{StakeProofInput, Store};
use sc_01_ledger::{apply_batch, compute_relative_state};
use shared_types::{
    commitment_message, Block, CommitmentKey, CommitmentProof, EpochBlock, GlobalState, Hash,
    RelativeState, SpendingBudget, StateTransition, COMMITTEE_SHARD,
};

/// Commitment proofs of up to `count` ancestors, most recent first.
///
/// Follows `prev_hash` through the block stash and stops at the first hash
/// that is not a stashed block (the epoch block).
pub fn previous_proofs(store: &dyn Store, prev_hash: &Hash, count: usize) -> Vec<CommitmentProof> {
    let mut proofs = Vec::with_capacity(count);
    let mut cursor = *prev_hash;
    while proofs.len() < count {
        let Some(parent) = store.block_by_hash(&cursor) else {
            break;
        };
        proofs.push(parent.commitment_proof);
        cursor = parent.prev_hash;
    }
    proofs
}

/// Run the block checks against `working`.
///
/// `epoch_block` supplies the shard layout, the proposer of each shard and
/// the proposer balance for the stake predicate. Returns the post-block
/// state and the block's relative state.
pub fn validate_block(
    ctx: &NodeContext,
    epoch_block: &EpochBlock,
    working: &GlobalState,
    block: &Block,
) -> Result<(GlobalState, RelativeState), RoundError> {
    let height = block.height;
    let shard_id = block.shard_id;

    if shard_id == 0 || shard_id > epoch_block.num_shards {
        return Err(RoundError::ShardOutOfRange {
            height,
            shard_id,
            num_shards: epoch_block.num_shards,
        });
    }

    // 1. known beneficiary
    let beneficiary = working
        .get(&block.beneficiary)
        .ok_or(RoundError::UnknownBeneficiary {
            height,
            shard_id,
            beneficiary: block.beneficiary,
        })?;

    // 2. staking
    if !beneficiary.is_staking {
        return Err(RoundError::NotStaking {
            height,
            shard_id,
            beneficiary: block.beneficiary,
        });
    }
    if epoch_block.mapping.proposer(shard_id) != Some(block.beneficiary) {
        return Err(RoundError::NotShardProposer {
            height,
            shard_id,
            beneficiary: block.beneficiary,
        });
    }

    // 3. commitment proof over the decimal height
    if !ctx.crypto.verify(
        &beneficiary.commitment_key,
        &commitment_message(height),
        &block.commitment_proof,
    ) {
        return Err(RoundError::CommitmentProof { height, shard_id });
    }

    // 4. stake predicate
    let prev_proofs = previous_proofs(
        ctx.store.as_ref(),
        &block.prev_hash,
        ctx.config.num_included_prev_proofs,
    );
    let balance = epoch_block
        .state
        .get(&block.beneficiary)
        .map(|account| account.balance)
        .unwrap_or(beneficiary.balance);
    let input = StakeProofInput {
        difficulty: ctx.config.difficulty,
        prev_proofs: &prev_proofs,
        height,
        balance,
        commitment_proof: &block.commitment_proof,
        timestamp: block.timestamp,
    };
    if !ctx.stake.validate(&input) {
        return Err(RoundError::StakeProof { height, shard_id });
    }

    // 5. transactions on a scratch copy
    let after = apply_batch(
        working.clone(),
        &block.beneficiary,
        &block.transactions,
        &ctx.config.ledger,
    )
    .map_err(|source| RoundError::InvalidBlock {
        height,
        shard_id,
        source,
    })?;
    let relative = compute_relative_state(working, &after, shard_id).map_err(|source| {
        RoundError::RelativeState {
            height,
            shard_id,
            source,
        }
    })?;

    Ok((after, relative))
}

/// Whether `transition` carries a valid commitment proof under `key`.
pub fn verify_transition(
    ctx: &NodeContext,
    key: &CommitmentKey,
    transition: &StateTransition,
) -> bool {
    transition.relative_state.shard_id == transition.shard_id
        && ctx.crypto.verify(
            key,
            &commitment_message(transition.height),
            &transition.commitment_proof,
        )
}

/// Charge the senders of `block` against the epoch's spending budget.
///
/// Nothing is charged when the block does not fit.
pub fn charge_block(budget: &mut SpendingBudget<'_>, block: &Block) -> Result<(), RoundError> {
    budget
        .try_charge_batch(&block.transactions)
        .map_err(|sender| RoundError::Overdraft {
            height: block.height,
            shard_id: block.shard_id,
            sender,
        })
}

/// Check that `epoch_block` closes the epoch `chain` is in.
///
/// It must sit exactly `epoch_length + 1` heights above the current epoch
/// block and come from the committee of the current mapping. A node that
/// mined this epoch also finds its own last block among the tips.
pub fn validate_epoch_block(
    chain: &ChainState,
    epoch_length: u64,
    epoch_block: &EpochBlock,
) -> Result<(), EpochBlockError> {
    if !epoch_block.is_sealed() {
        return Err(EpochBlockError::Unsealed);
    }
    if epoch_block.mapping.is_empty() {
        return Err(EpochBlockError::EmptyMapping);
    }

    let expected = chain.epoch_height() + epoch_length + 1;
    if epoch_block.height != expected {
        return Err(EpochBlockError::WrongHeight {
            expected,
            found: epoch_block.height,
        });
    }

    if chain.mapping.proposer(COMMITTEE_SHARD) != Some(epoch_block.beneficiary) {
        return Err(EpochBlockError::NotCommittee {
            beneficiary: epoch_block.beneficiary,
        });
    }

    if epoch_block.prev_shard_hashes.len() != usize::from(chain.num_shards) {
        return Err(EpochBlockError::ShardTips {
            expected: chain.num_shards,
            found: epoch_block.prev_shard_hashes.len(),
        });
    }

    if let Some(own) = chain
        .last_block
        .as_ref()
        .filter(|block| block.height == expected - 1)
    {
        let index = usize::from(own.shard_id).saturating_sub(1);
        if epoch_block.prev_shard_hashes.get(index) != Some(&own.hash) {
            return Err(EpochBlockError::BrokenLink {
                shard_id: own.shard_id,
            });
        }
    }

    Ok(())
}
