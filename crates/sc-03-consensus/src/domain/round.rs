//! Committee round outcomes and per-epoch reports.

use super::chain::Role;
use super::slashing::SlashingProof;
use shared_types::{EpochBlock, Height, ShardId};

/// Result of a committee round that ran to completion.
#[derive(Clone, Debug)]
pub enum RoundOutcome {
    /// All shards agreed; the next epoch block is ready.
    Closed(EpochBlock),
    /// At least one shard's transition contradicted the committee.
    CheatDetected(Vec<SlashingProof>),
}

/// What one pass of the engine loop did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochReport {
    pub epoch_height: Height,
    pub next_epoch_height: Height,
    pub role: Role,
    pub shard_id: Option<ShardId>,
    pub blocks_mined: usize,
    pub transitions_merged: usize,
    pub rounds_retried: usize,
}
