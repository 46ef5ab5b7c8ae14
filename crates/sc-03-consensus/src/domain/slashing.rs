//! # Slashing Registry
//!
//! Evidence of shards whose claimed relative state disagreed with the
//! committee's recomputation. Evidence is collected, never enforced.

use sc_01_ledger::BalanceMismatch;
use shared_types::{Address, Hash, Height, ShardId};
use std::collections::{BTreeMap, HashSet};

/// A shard's signed claim contradicted by the committee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashingProof {
    pub height: Height,
    pub shard_id: ShardId,
    /// Validator that signed the transition.
    pub proposer: Option<Address>,
    pub transition_hash: Hash,
    pub mismatches: Vec<BalanceMismatch>,
}

/// Slashing evidence recorded by this node.
#[derive(Debug, Default)]
pub struct SlashingRegistry {
    proofs: Vec<SlashingProof>,
    seen: HashSet<Hash>,
    offences: BTreeMap<ShardId, u64>,
}

impl SlashingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `proof`; returns false if the same transition was already recorded.
    pub fn record(&mut self, proof: SlashingProof) -> bool {
        if !self.seen.insert(proof.transition_hash) {
            return false;
        }
        *self.offences.entry(proof.shard_id).or_default() += 1;
        self.proofs.push(proof);
        true
    }

    pub fn proofs(&self) -> &[SlashingProof] {
        &self.proofs
    }

    /// Offences recorded against `shard_id`.
    pub fn offences(&self, shard_id: ShardId) -> u64 {
        self.offences.get(&shard_id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }
}
