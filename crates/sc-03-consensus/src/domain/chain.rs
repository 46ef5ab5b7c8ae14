//! # Chain State
//!
//! The node's view of the current epoch. Owned by the engine task; nothing
//! else writes it.

use shared_types::{
    Address, Block, EpochBlock, GlobalState, Hash, Height, ShardId, ValidatorShardMapping,
    COMMITTEE_SHARD,
};
use std::collections::BTreeMap;

/// What a node does during an epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Proposer of shard 1: mines, routes and closes the epoch.
    Committee,
    /// Proposer of another shard: mines and reconciles.
    Proposer(ShardId),
    /// Mapped to a shard without proposing, or not mapped at all.
    Observer(Option<ShardId>),
}

impl Role {
    pub fn shard_id(&self) -> Option<ShardId> {
        match self {
            Self::Committee => Some(COMMITTEE_SHARD),
            Self::Proposer(shard) => Some(*shard),
            Self::Observer(shard) => *shard,
        }
    }

    pub fn is_committee(&self) -> bool {
        matches!(self, Self::Committee)
    }
}

/// Live state of one node for the epoch it is in.
#[derive(Clone, Debug)]
pub struct ChainState {
    /// Live global state, replaced after every successful batch.
    pub state: GlobalState,
    pub mapping: ValidatorShardMapping,
    pub num_shards: ShardId,
    pub role: Role,
    /// Epoch block the current epoch started from.
    pub epoch_block: EpochBlock,
    /// Last block this node mined in the current epoch.
    pub last_block: Option<Block>,
    /// Shard this node served, by epoch height.
    pub shard_history: BTreeMap<Height, ShardId>,
}

impl ChainState {
    pub fn from_epoch_block(epoch_block: EpochBlock, address: &Address) -> Self {
        let mut chain = Self {
            state: GlobalState::new(),
            mapping: ValidatorShardMapping::default(),
            num_shards: 0,
            role: Role::Observer(None),
            epoch_block: epoch_block.clone(),
            last_block: None,
            shard_history: BTreeMap::new(),
        };
        chain.enter_epoch(epoch_block, address);
        chain
    }

    /// Adopt `epoch_block` as the start of the next epoch.
    pub fn enter_epoch(&mut self, epoch_block: EpochBlock, address: &Address) {
        let shard = epoch_block.mapping.shard_of(address);
        let proposes = |shard: ShardId| epoch_block.mapping.proposer(shard) == Some(*address);
        self.role = match shard {
            Some(COMMITTEE_SHARD) if proposes(COMMITTEE_SHARD) => Role::Committee,
            Some(shard) if proposes(shard) => Role::Proposer(shard),
            other => Role::Observer(other),
        };
        if let Some(shard) = shard {
            self.shard_history.insert(epoch_block.height, shard);
        }
        self.state = epoch_block.state.clone();
        self.mapping = epoch_block.mapping.clone();
        self.num_shards = epoch_block.num_shards;
        self.last_block = None;
        self.epoch_block = epoch_block;
    }

    pub fn epoch_height(&self) -> Height {
        self.epoch_block.height
    }

    pub fn shard_id(&self) -> Option<ShardId> {
        self.role.shard_id()
    }

    /// Heights mined in the current epoch.
    pub fn epoch_heights(&self, epoch_length: u64) -> std::ops::RangeInclusive<Height> {
        self.epoch_height() + 1..=self.epoch_height() + epoch_length
    }

    /// Parent hash for the next block: the last mined block, or the epoch block.
    pub fn tip_hash(&self) -> Hash {
        self.last_block
            .as_ref()
            .map(|block| block.hash)
            .unwrap_or(self.epoch_block.hash)
    }

    /// Balance `address` held when the epoch started.
    pub fn epoch_balance(&self, address: &Address) -> Option<u64> {
        self.epoch_block.state.get(address).map(|account| account.balance)
    }
}
