//! # Keccak Stake Predicate
//!
//! A block qualifies when the leading 64 bits of
//! `keccak(prev_proofs ‖ height ‖ commitment_proof ‖ timestamp)` fall under
//! a target that grows with the validator's balance and shrinks with the
//! difficulty. The finalizer searches timestamps until one qualifies.

use async_trait::async_trait;
use sc_03_consensus::{
    BlockFinalizer, ConsensusError, ConsensusResult, ProofOfStake, StakeContext, StakeProofInput,
};
use shared_types::{Block, ContentHasher, Hash};
use std::sync::Arc;
use tracing::trace;

/// Attempts between yields to the scheduler.
const YIELD_EVERY: u64 = 1024;

#[derive(Clone, Copy, Debug, Default)]
pub struct KeccakStakePredicate;

impl KeccakStakePredicate {
    pub fn digest(input: &StakeProofInput<'_>) -> Hash {
        let mut hasher = ContentHasher::new(b"stake").u64(input.prev_proofs.len() as u64);
        for proof in input.prev_proofs {
            hasher = hasher.fixed(proof);
        }
        hasher
            .u64(input.height)
            .fixed(input.commitment_proof)
            .u64(input.timestamp)
            .finish()
    }

    /// `(u64::MAX >> difficulty) * balance`, widened so it cannot overflow.
    pub fn target(difficulty: u32, balance: u64) -> u128 {
        let base = u64::MAX.checked_shr(difficulty).unwrap_or(0);
        u128::from(base) * u128::from(balance)
    }
}

impl ProofOfStake for KeccakStakePredicate {
    fn validate(&self, input: &StakeProofInput<'_>) -> bool {
        let digest = Self::digest(input);
        let mut leading = [0u8; 8];
        leading.copy_from_slice(&digest[..8]);
        u128::from(u64::from_be_bytes(leading)) <= Self::target(input.difficulty, input.balance)
    }
}

/// Searches timestamps upward from the block's own until the predicate holds.
pub struct StakeFinalizer {
    stake: Arc<dyn ProofOfStake>,
    max_attempts: u64,
}

impl StakeFinalizer {
    pub fn new(stake: Arc<dyn ProofOfStake>, max_attempts: u64) -> Self {
        Self {
            stake,
            max_attempts,
        }
    }
}

#[async_trait]
impl BlockFinalizer for StakeFinalizer {
    async fn finalize(&self, mut block: Block, context: &StakeContext) -> ConsensusResult<Block> {
        let start = block.timestamp;
        for attempt in 0..self.max_attempts {
            let timestamp = start.saturating_add(attempt);
            let input = StakeProofInput {
                difficulty: context.difficulty,
                prev_proofs: &context.prev_proofs,
                height: block.height,
                balance: context.balance,
                commitment_proof: &block.commitment_proof,
                timestamp,
            };
            if self.stake.validate(&input) {
                trace!(height = block.height, attempts = attempt + 1, "Stake proof found");
                block.timestamp = timestamp;
                return Ok(block.seal());
            }
            if attempt % YIELD_EVERY == YIELD_EVERY - 1 {
                tokio::task::yield_now().await;
            }
        }
        Err(ConsensusError::Finalizer(block.height))
    }
}
